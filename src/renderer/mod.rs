//! Play-field drawing
//!
//! The browser build draws onto a 2D canvas; the palette is shared so the
//! HUD and any future renderer agree on rank colors.

#[cfg(target_arch = "wasm32")]
pub mod canvas;

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasRenderer;

use crate::sim::Rank;

/// Fill color per rank (CSS hex)
const PALETTE: [&str; 11] = [
    "#e63946", // 0 cherry
    "#f4a261", // 1 strawberry
    "#9b5de5", // 2 grape
    "#ffb703", // 3 dekopon
    "#fb8500", // 4 persimmon
    "#d62828", // 5 apple
    "#ffe066", // 6 pear
    "#ff8fab", // 7 peach
    "#f9c74f", // 8 pineapple
    "#90be6d", // 9 melon
    "#2a9d8f", // 10 watermelon
];

/// Fill color for a rank
pub fn rank_color(rank: Rank) -> &'static str {
    PALETTE[rank.value() as usize]
}
