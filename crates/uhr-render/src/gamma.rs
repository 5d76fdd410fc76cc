//! Gamma correction for WS2812-class LED strips.
//!
//! LED drivers take linear PWM duty values, but human brightness perception
//! is roughly logarithmic. Writing linear channel values makes the low end
//! of the scale look washed out and compresses all perceived dimming into
//! the top quarter of the range. The conventional fix is a power-law
//! transfer curve applied per channel just before output:
//!
//! ```text
//! out = round((in / 255) ^ 2.8 * 255)
//! ```
//!
//! The exponent 2.8 is the de-facto standard for WS2812 strips. The curve
//! is precomputed into a 256-entry table so the per-frame cost is a single
//! indexed load per channel.
//!
//! # Examples
//!
//! ```
//! use uhr_render::gamma;
//!
//! assert_eq!(gamma::correct(0), 0);
//! assert_eq!(gamma::correct(255), 255);
//! // Half duty maps far down the curve.
//! assert_eq!(gamma::correct(128), 37);
//! ```

/// Gamma 2.8 transfer table for 8-bit channels.
pub const GAMMA8: [u8; 256] = [
      0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   1,   1,   1,   1,
      1,   1,   1,   1,   1,   1,   1,   1,   1,   2,   2,   2,   2,   2,   2,   2,
      2,   3,   3,   3,   3,   3,   3,   3,   4,   4,   4,   4,   4,   5,   5,   5,
      5,   6,   6,   6,   6,   7,   7,   7,   7,   8,   8,   8,   9,   9,   9,  10,
     10,  10,  11,  11,  11,  12,  12,  13,  13,  13,  14,  14,  15,  15,  16,  16,
     17,  17,  18,  18,  19,  19,  20,  20,  21,  21,  22,  22,  23,  24,  24,  25,
     25,  26,  27,  27,  28,  29,  29,  30,  31,  32,  32,  33,  34,  35,  35,  36,
     37,  38,  39,  39,  40,  41,  42,  43,  44,  45,  46,  47,  48,  49,  50,  50,
     51,  52,  54,  55,  56,  57,  58,  59,  60,  61,  62,  63,  64,  66,  67,  68,
     69,  70,  72,  73,  74,  75,  77,  78,  79,  81,  82,  83,  85,  86,  87,  89,
     90,  92,  93,  95,  96,  98,  99, 101, 102, 104, 105, 107, 109, 110, 112, 114,
    115, 117, 119, 120, 122, 124, 126, 127, 129, 131, 133, 135, 137, 138, 140, 142,
    144, 146, 148, 150, 152, 154, 156, 158, 160, 162, 164, 167, 169, 171, 173, 175,
    177, 180, 182, 184, 186, 189, 191, 193, 196, 198, 200, 203, 205, 208, 210, 213,
    215, 218, 220, 223, 225, 228, 231, 233, 236, 239, 241, 244, 247, 249, 252, 255,
];

/// Applies the gamma 2.8 curve to a single 8-bit channel value.
#[must_use]
pub fn correct(value: u8) -> u8 {
    GAMMA8[usize::from(value)]
}
