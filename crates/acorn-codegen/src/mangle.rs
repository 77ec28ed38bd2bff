//! Symbol name mangling.
//!
//! Every emitted method gets a C-compatible symbol uniquely determined by
//! its typed signature: `_A_` + function name + `_` + the method's mangled
//! signature tag. The tags are ASCII and length-free (single-letter kinds
//! followed by digit sizes or nested structural tags), so two methods with
//! distinct parameter-or-return types never collide.

/// Mangle a plain global name.
pub fn mangle(name: &str) -> String {
    format!("_A_{name}")
}

/// Mangle a method symbol from its function name and signature tag.
pub fn mangle_method(name: &str, signature_tag: &str) -> String {
    format!("_A_{name}_{signature_tag}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_get_the_prefix() {
        assert_eq!(mangle("counter"), "_A_counter");
    }

    #[test]
    fn methods_append_their_signature() {
        assert_eq!(mangle_method("add", "mi64i64i64"), "_A_add_mi64i64i64");
        assert_eq!(mangle_method("add", "mf64f64f64"), "_A_add_mf64f64f64");
    }
}
