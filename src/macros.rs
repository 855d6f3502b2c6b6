/// Compile a regex literal once and hand out a `&'static Regex`.
///
/// Only used for patterns written in this crate; rule-file patterns go through
/// `engine::Pattern::compile`, which reports errors instead of panicking.
#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}
