//! All-or-nothing execution over cloneable state.

/// Runs `op` against `state`, restoring the snapshot taken beforehand if it
/// fails.
///
/// Vault operations validate their preconditions before touching anything,
/// but slippage and arithmetic checks can only run after tokens have moved.
/// Wrapping the vault and its collaborators in a single state value and
/// executing through `atomic` rolls all of them back together.
///
/// ```
/// use clmm_hypervisor::tx::atomic;
///
/// let mut balances = vec![10u64, 0];
/// let result: Result<(), &str> = atomic(&mut balances, |b| {
///     b[0] -= 5;
///     b[1] += 5;
///     Err("slippage")
/// });
/// assert!(result.is_err());
/// assert_eq!(balances, vec![10, 0]);
/// ```
pub fn atomic<S, T, E>(state: &mut S, op: impl FnOnce(&mut S) -> Result<T, E>) -> Result<T, E>
where
    S: Clone,
{
    let snapshot = state.clone();
    match op(state) {
        Ok(value) => Ok(value),
        Err(err) => {
            *state = snapshot;
            Err(err)
        }
    }
}
