//! Persistent collection aliases.
//!
//! Vex values are immutable and cheaply cloneable; composite values use
//! structural sharing via the `im` crate. The aliases keep the concrete
//! collection choice in one place.

/// Persistent vector with structural sharing.
pub type VxVec<T> = im::Vector<T>;

/// Persistent hash map with structural sharing.
pub type VxMap<K, V> = im::HashMap<K, V>;
