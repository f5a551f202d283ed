/// Identity of an item stored in a [`crate::TreeData`].
pub trait TreeKey: core::hash::Hash + Eq + Clone {}
impl<T: core::hash::Hash + Eq + Clone> TreeKey for T {}
