//! Built-in mergers.

pub mod array;
pub mod equality;
pub mod keyed;
pub mod map;
pub mod object;
pub mod router;
pub mod string;

pub use array::{ArrayKeyFn, ArrayMerger, ArrayShape};
pub use equality::EqualityMerger;
pub use keyed::{KeyedMerger, KeyedShape};
pub use map::{MapMerger, MapNode, MapShape};
pub use object::{ObjectMerger, ObjectShape};
pub use router::{RouteMerger, RouteSegment};
pub use string::StringMerger;
