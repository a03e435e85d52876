//! # Recommendation Graph Model
//!
//! Plain data types shared by every layer: storage ↔ graph ↔ algorithms ↔ user.
//!
//! Design rule: no I/O and no graph state here. Loading content records
//! lives in `content`, node/edge storage in `storage`.

pub mod node;
pub mod edge;
pub mod value;
pub mod frame;

pub use node::{Node, NodeKind, NodeRef};
pub use edge::{Direction, EdgeData};
pub use value::Value;
pub use frame::{Frame, RatingRow, Row};
