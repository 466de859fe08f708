//! Helper macro for the synchronous surface every slice shares.
//!
//! Slices differ in their gateway calls; reading state, filter and
//! pagination mutators, error clearing and store registration are identical
//! apart from the record, filter and cache types.

macro_rules! slice_surface {
    (
        $slice:ident<$gateway:ident>,
        key: $key:expr,
        record: $record:ty,
        filters: $filters:ty,
        patch: $patch:ty,
        caches: $caches:ty $(,)?
    ) => {
        impl<G: $gateway> $slice<G> {
            /// Current time according to the slice's clock; the default `now`
            /// for selectors.
            pub fn now(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.core.now()
            }

            /// Construction options.
            pub fn options(&self) -> $crate::store::SliceOptions {
                self.core.options()
            }

            /// Run `view` against the current state under the slice lock.
            pub fn read<T>(
                &self,
                view: impl FnOnce(&$crate::store::SliceState<$record, $filters, $caches>) -> T,
            ) -> T {
                self.core.read(view)
            }

            /// Owned copy of the current state.
            pub fn snapshot(&self) -> $crate::store::SliceState<$record, $filters, $caches> {
                self.core.snapshot()
            }

            /// Shallow-merge `patch` into the filters and return to page 1.
            pub fn update_filters(&self, patch: $patch) {
                self.core
                    .mutate(|state| state.update_filters(|filters| patch.apply_to(filters)));
            }

            /// Restore empty filters and return to page 1.
            pub fn reset_filters(&self) {
                self.core.mutate(|state| state.reset_filters());
            }

            /// Merge `patch` into the pagination state.
            pub fn set_pagination(&self, patch: ::pagination::PaginationPatch) {
                self.core.mutate(|state| state.set_pagination(patch));
            }

            /// Clear the stored error of `kind`.
            pub fn clear_error(&self, kind: $crate::domain::OperationKind) {
                self.core
                    .mutate(|state| state.operations_mut().clear_error(kind));
            }

            /// Clear every stored error.
            pub fn clear_errors(&self) {
                self.core.mutate(|state| state.operations_mut().clear_errors());
            }

            /// Empty the focus slot.
            pub fn clear_current(&self) {
                self.core.mutate(|state| state.clear_current());
            }
        }

        impl<G: $gateway + 'static> $crate::store::ManagedSlice for $slice<G> {
            fn key(&self) -> $crate::domain::ports::SliceKey {
                $key
            }

            fn export(&self) -> Result<::serde_json::Value, ::serde_json::Error> {
                self.core.export()
            }

            fn hydrate(&self, snapshot: ::serde_json::Value) -> Result<(), ::serde_json::Error> {
                self.core.hydrate(snapshot)
            }

            fn reset(&self) {
                self.core.reset();
            }
        }
    };
}

pub(crate) use slice_surface;
