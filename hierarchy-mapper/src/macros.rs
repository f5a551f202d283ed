// Log through `tracing` under the `hierarchy_mapper` target when the feature is on; expand to
// nothing otherwise, so arguments are not evaluated.
//
//     hlog!(debug, delta, inserted, "do_expand");

#[cfg(feature = "tracing")]
macro_rules! hlog {
    (trace, $($tt:tt)*) => {
        tracing::trace!(target: "hierarchy_mapper", $($tt)*)
    };
    (debug, $($tt:tt)*) => {
        tracing::debug!(target: "hierarchy_mapper", $($tt)*)
    };
    (warn, $($tt:tt)*) => {
        tracing::warn!(target: "hierarchy_mapper", $($tt)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! hlog {
    ($level:ident, $($tt:tt)*) => {};
}
