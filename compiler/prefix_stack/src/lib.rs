//! Stack growth for deep evaluator recursion.
//!
//! Statement and expression evaluation recurse once per nesting level and
//! once per user function call. Scripts that recurse deeply (or a host
//! running the evaluator on a small worker-thread stack) would otherwise
//! overflow the native stack before the interpreter's own recursion limit
//! kicks in.
//!
//! On native targets [`ensure_sufficient_stack`] switches to a freshly
//! allocated segment when the remaining stack drops under the red zone.
//! On `wasm32` it calls straight through.

/// Remaining stack below which a new segment is allocated.
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated segment.
const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

/// Run `f`, growing the stack first if less than the red zone remains.
///
/// ```text
/// fn eval_expr(&mut self, expr: &Expr) -> EvalResult {
///     ensure_sufficient_stack(|| self.eval_expr_inner(expr))
/// }
/// ```
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

/// Bytes of stack left on the current segment, if the platform reports it.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn remaining_stack() -> Option<usize> {
    stacker::remaining_stack()
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn remaining_stack() -> Option<usize> {
    None
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;

    #[test]
    fn test_nested_sum() {
        fn sum_to(n: u64) -> u64 {
            ensure_sufficient_stack(|| if n == 0 { 0 } else { n + sum_to(n - 1) })
        }

        assert_eq!(sum_to(100), 5050);
    }

    #[test]
    fn test_deep_recursion_on_small_thread() {
        fn depth(n: u32) -> u32 {
            ensure_sufficient_stack(|| if n == 0 { 0 } else { depth(n - 1) + 1 })
        }

        // 256 KiB thread stack; 50k frames would overflow it without growth
        let handle = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(|| depth(50_000))
            .unwrap();
        assert_eq!(handle.join().unwrap(), 50_000);
    }

    #[test]
    fn test_passes_result_through() {
        let r: Result<u8, String> = ensure_sufficient_stack(|| Err("boom".to_string()));
        assert_eq!(r, Err("boom".to_string()));
    }

    #[test]
    fn test_remaining_stack_reported() {
        if let Some(left) = remaining_stack() {
            assert!(left > 0);
        }
    }
}
