pub mod hit;
pub mod index;
pub mod snap;

pub use hit::{
    HANDLE_THRESHOLD, Handle, HandleHit, ROTATION_HANDLE_OFFSET, handle_positions,
    hit_test_document, hit_test_handles, hit_test_rect,
};
pub use index::{CELL_SIZE, SpatialIndex};
pub use snap::{Guide, GuideOrientation, ResizeSnapResult, SnapConfig, SnapResult, snap_layer, snap_resize};
