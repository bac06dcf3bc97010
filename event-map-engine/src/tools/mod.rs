//! Operator-facing tools: selection, picking and the dashboard.
//!
//! ## Selection Flow
//!
//! ```text
//! Pointer down / panel row / F key / select_anchor RPC with `frame`
//!   └─> focus_anchor(): Selection::select() + frame the anchor
//!       └─> SelectionChanged
//!           ├─> Marker scale boost on the next animation pass
//!           └─> Dashboard refresh + `anchor_selected` notification
//! ```
//!
//! Escape (native) and the `clear_selection` RPC deselect. A pick that hits
//! nothing registered leaves the selection unchanged. A double click on the
//! model also moves the orbit centre to the clicked point.

/// Dashboard snapshot, native panel and periodic notifications.
pub mod dashboard;

/// Marker-first pointer picking with scene-surface fallback.
pub mod picking;

/// Single-anchor selection state and its change event.
pub mod selection;
