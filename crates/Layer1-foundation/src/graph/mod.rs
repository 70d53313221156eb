//! Graph - 순서 제약 그래프
//!
//! - `dag.rs` - `before`/`after` 제약을 가진 named-vertex DAG + 위상 정렬

mod dag;

pub use dag::{DagMap, SortedVertex};
