pub mod resource;

// One screen per configured resource, all rendered by resource.rs:
// - Tab bar (one tab per resource)
// - Record table for the current page
// - Page navigation with previous/next availability
// - Create form, delete confirmation and help overlays

pub use resource::ResourceScreen;
