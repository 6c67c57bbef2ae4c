use crate::syntax::tree::{Decorator, FuncDef, FunctionVisitor, Module, walk_functions};

/// Append `@name` to every function definition in `module` that does not
/// already carry it, nested functions and methods included.
///
/// A function counts as already decorated when one of its decorators is
/// `@name` or `@name(...)`, so running this twice changes nothing.
/// Returns how many functions were decorated.
pub fn add_decorator<'src>(module: &mut Module<'src>, name: &'src str) -> usize {
    let mut adder = DecoratorAdder { name, added: 0 };
    walk_functions(&mut module.body, &mut adder);
    adder.added
}

struct DecoratorAdder<'src> {
    name: &'src str,
    added: usize,
}

impl<'src> FunctionVisitor<'src> for DecoratorAdder<'src> {
    fn visit_function(&mut self, func: &mut FuncDef<'src>) {
        if func.decorators.iter().any(|d| d.is_named(self.name)) {
            tracing::trace!(function = func.name, decorator = self.name, "already decorated");
            return;
        }
        tracing::debug!(function = func.name, decorator = self.name, "adding decorator");
        func.decorators.push(Decorator::inserted(self.name));
        self.added += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{parse, unparse};

    fn decorate(src: &str, name: &str) -> (String, usize) {
        let mut module = parse(src).unwrap();
        let n = add_decorator(&mut module, name);
        (unparse(&module), n)
    }

    #[test]
    fn test_single_function() {
        let (out, n) = decorate("def f(x): return x+1\n", "njit");
        assert_eq!(out, "@njit\ndef f(x): return x+1\n");
        assert_eq!(n, 1);
    }

    #[test]
    fn test_nested_functions_and_methods() {
        let src = "\
class Grid:
    def area(self):
        def helper():
            return 1
        return helper()

if True:
    async def fetch():
        pass
";
        let (out, n) = decorate(src, "lru_cache");
        assert_eq!(n, 3);
        assert_eq!(
            out,
            "\
class Grid:
    @lru_cache
    def area(self):
        @lru_cache
        def helper():
            return 1
        return helper()

if True:
    @lru_cache
    async def fetch():
        pass
"
        );
    }

    #[test]
    fn test_appended_after_existing_decorators() {
        let src = "@property\ndef value(self):\n    return 1\n";
        let (out, _) = decorate(src, "njit");
        assert_eq!(out, "@property\n@njit\ndef value(self):\n    return 1\n");
    }

    #[test]
    fn test_existing_decorator_not_duplicated() {
        let src = "@lru_cache(maxsize=None)\ndef a():\n    pass\n\n@lru_cache\ndef b():\n    pass\n";
        let (out, n) = decorate(src, "lru_cache");
        assert_eq!(n, 0);
        assert_eq!(out, src);
    }

    #[test]
    fn test_idempotent_on_same_tree() {
        let mut module = parse("def f():\n    pass\n").unwrap();
        assert_eq!(add_decorator(&mut module, "njit"), 1);
        assert_eq!(add_decorator(&mut module, "njit"), 0);
        assert_eq!(unparse(&module).matches("@njit").count(), 1);
    }

    #[test]
    fn test_qualified_decorator_is_different() {
        let (out, n) = decorate("@numba.njit\ndef f():\n    pass\n", "njit");
        assert_eq!(n, 1);
        assert!(out.contains("@numba.njit\n@njit\ndef f"));
    }

    #[test]
    fn test_classes_are_not_decorated() {
        let (out, n) = decorate("class A:\n    x = 1\n", "njit");
        assert_eq!(n, 0);
        assert!(!out.contains("@njit"));
    }
}
