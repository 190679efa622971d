//! Color types and SVG color string parsing
use bytemuck::{Pod, Zeroable};
use std::{fmt, str::FromStr};

/// 8-bit per channel RGBA color, memory layout is `[r, g, b, a]`
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable)]
#[repr(C)]
pub struct RGBA {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl RGBA {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    pub const fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Replace alpha with `alpha * opacity`
    pub fn with_opacity(self, opacity: f32) -> Self {
        let a = (self.a as f32 * opacity.clamp(0.0, 1.0) + 0.5) as u8;
        Self { a, ..self }
    }
}

impl fmt::Debug for RGBA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for RGBA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { r, g, b, a } = self;
        write!(f, "#{r:02x}{g:02x}{b:02x}")?;
        if *a != 255 {
            write!(f, "{a:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for RGBA {
    type Err = ColorError;

    /// Parse SVG color value: `#rgb`, `#rrggbb`, `#rrggbbaa`,
    /// `rgb(r, g, b)` with integer or percentage components, or a color
    /// keyword (including `transparent`).
    fn from_str(color: &str) -> Result<Self, Self::Err> {
        let color = color.trim();
        if let Some(hex) = color.strip_prefix('#') {
            return parse_hex(hex).ok_or(ColorError::Malformed);
        }
        if let Some(args) = color
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return parse_rgb_args(args).ok_or(ColorError::Malformed);
        }
        match COLOR_KEYWORDS.binary_search_by_key(&color, |(name, _)| name) {
            Ok(index) => Ok(COLOR_KEYWORDS[index].1),
            Err(_) => Err(ColorError::Malformed),
        }
    }
}

fn hex_digit(byte: u8) -> Option<u8> {
    match byte {
        b'A'..=b'F' => Some(byte - b'A' + 10),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'0'..=b'9' => Some(byte - b'0'),
        _ => None,
    }
}

fn parse_hex(hex: &str) -> Option<RGBA> {
    let bytes = hex.as_bytes();
    match bytes.len() {
        // #rgb is shorthand for #rrggbb
        3 => {
            let r = hex_digit(bytes[0])?;
            let g = hex_digit(bytes[1])?;
            let b = hex_digit(bytes[2])?;
            Some(RGBA::new(r << 4 | r, g << 4 | g, b << 4 | b, 255))
        }
        6 | 8 => {
            let mut channels = [0u8, 0, 0, 255];
            for (channel, pair) in channels.iter_mut().zip(bytes.chunks(2)) {
                *channel = hex_digit(pair[0])? << 4 | hex_digit(pair[1])?;
            }
            let [r, g, b, a] = channels;
            Some(RGBA::new(r, g, b, a))
        }
        _ => None,
    }
}

fn parse_rgb_args(args: &str) -> Option<RGBA> {
    let mut channels = [0u8; 3];
    let mut parts = args.split(',');
    for channel in channels.iter_mut() {
        let part = parts.next()?.trim();
        let value = if let Some(percent) = part.strip_suffix('%') {
            percent.trim().parse::<f32>().ok()? * 255.0 / 100.0
        } else {
            part.parse::<f32>().ok()?
        };
        *channel = value.clamp(0.0, 255.0).round() as u8;
    }
    if parts.next().is_some() {
        return None;
    }
    let [r, g, b] = channels;
    Some(RGBA::new(r, g, b, 255))
}

/// Alpha premultiplied RGBA color with f32 components
///
/// All blending and gradient interpolation goes through this type so
/// that intermediate results do not lose precision to 8-bit rounding.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColorF([f32; 4]);

impl ColorF {
    #[inline]
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self([r, g, b, a])
    }

    #[inline]
    pub fn alpha(self) -> f32 {
        self.0[3]
    }

    /// Blend `other` over self (premultiplied alpha-over)
    #[inline]
    pub fn blend_over(self, other: Self) -> Self {
        let Self([r0, g0, b0, a0]) = self;
        let Self([r1, g1, b1, a1]) = other;
        let k = 1.0 - a1;
        Self([r1 + r0 * k, g1 + g0 * k, b1 + b0 * k, a1 + a0 * k])
    }

    /// Linear interpolation between self and the other color
    #[inline]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let Self([r0, g0, b0, a0]) = self;
        let Self([r1, g1, b1, a1]) = other;
        let k = 1.0 - t;
        Self([
            r0 * k + r1 * t,
            g0 * k + g1 * t,
            b0 * k + b1 * t,
            a0 * k + a1 * t,
        ])
    }

    /// Scale all components, used for coverage and opacity modulation
    #[inline]
    pub fn mul_alpha(self, value: f32) -> Self {
        let Self([r, g, b, a]) = self;
        Self([r * value, g * value, b * value, a * value])
    }
}

impl From<RGBA> for ColorF {
    fn from(color: RGBA) -> Self {
        let a = color.a as f32 / 255.0;
        Self([
            color.r as f32 / 255.0 * a,
            color.g as f32 / 255.0 * a,
            color.b as f32 / 255.0 * a,
            a,
        ])
    }
}

impl From<ColorF> for RGBA {
    fn from(color: ColorF) -> Self {
        let ColorF([r, g, b, a]) = color;
        if a <= f32::EPSILON {
            return RGBA::transparent();
        }
        let undo = |channel: f32| ((channel / a).clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
        RGBA::new(undo(r), undo(g), undo(b), (a.clamp(0.0, 1.0) * 255.0 + 0.5) as u8)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    Malformed,
}

impl fmt::Display for ColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorError::Malformed => {
                write!(f, "color is not a keyword, #hex or rgb() value")
            }
        }
    }
}

impl std::error::Error for ColorError {}

/// SVG 1.1 color keywords, sorted by name for binary search
const COLOR_KEYWORDS: &[(&str, RGBA)] = &[
    ("aliceblue", RGBA::new(240, 248, 255, 255)),
    ("antiquewhite", RGBA::new(250, 235, 215, 255)),
    ("aqua", RGBA::new(0, 255, 255, 255)),
    ("aquamarine", RGBA::new(127, 255, 212, 255)),
    ("azure", RGBA::new(240, 255, 255, 255)),
    ("beige", RGBA::new(245, 245, 220, 255)),
    ("bisque", RGBA::new(255, 228, 196, 255)),
    ("black", RGBA::new(0, 0, 0, 255)),
    ("blanchedalmond", RGBA::new(255, 235, 205, 255)),
    ("blue", RGBA::new(0, 0, 255, 255)),
    ("blueviolet", RGBA::new(138, 43, 226, 255)),
    ("brown", RGBA::new(165, 42, 42, 255)),
    ("burlywood", RGBA::new(222, 184, 135, 255)),
    ("cadetblue", RGBA::new(95, 158, 160, 255)),
    ("chartreuse", RGBA::new(127, 255, 0, 255)),
    ("chocolate", RGBA::new(210, 105, 30, 255)),
    ("coral", RGBA::new(255, 127, 80, 255)),
    ("cornflowerblue", RGBA::new(100, 149, 237, 255)),
    ("cornsilk", RGBA::new(255, 248, 220, 255)),
    ("crimson", RGBA::new(220, 20, 60, 255)),
    ("cyan", RGBA::new(0, 255, 255, 255)),
    ("darkblue", RGBA::new(0, 0, 139, 255)),
    ("darkcyan", RGBA::new(0, 139, 139, 255)),
    ("darkgoldenrod", RGBA::new(184, 134, 11, 255)),
    ("darkgray", RGBA::new(169, 169, 169, 255)),
    ("darkgreen", RGBA::new(0, 100, 0, 255)),
    ("darkgrey", RGBA::new(169, 169, 169, 255)),
    ("darkkhaki", RGBA::new(189, 183, 107, 255)),
    ("darkmagenta", RGBA::new(139, 0, 139, 255)),
    ("darkolivegreen", RGBA::new(85, 107, 47, 255)),
    ("darkorange", RGBA::new(255, 140, 0, 255)),
    ("darkorchid", RGBA::new(153, 50, 204, 255)),
    ("darkred", RGBA::new(139, 0, 0, 255)),
    ("darksalmon", RGBA::new(233, 150, 122, 255)),
    ("darkseagreen", RGBA::new(143, 188, 143, 255)),
    ("darkslateblue", RGBA::new(72, 61, 139, 255)),
    ("darkslategray", RGBA::new(47, 79, 79, 255)),
    ("darkslategrey", RGBA::new(47, 79, 79, 255)),
    ("darkturquoise", RGBA::new(0, 206, 209, 255)),
    ("darkviolet", RGBA::new(148, 0, 211, 255)),
    ("deeppink", RGBA::new(255, 20, 147, 255)),
    ("deepskyblue", RGBA::new(0, 191, 255, 255)),
    ("dimgray", RGBA::new(105, 105, 105, 255)),
    ("dimgrey", RGBA::new(105, 105, 105, 255)),
    ("dodgerblue", RGBA::new(30, 144, 255, 255)),
    ("firebrick", RGBA::new(178, 34, 34, 255)),
    ("floralwhite", RGBA::new(255, 250, 240, 255)),
    ("forestgreen", RGBA::new(34, 139, 34, 255)),
    ("fuchsia", RGBA::new(255, 0, 255, 255)),
    ("gainsboro", RGBA::new(220, 220, 220, 255)),
    ("ghostwhite", RGBA::new(248, 248, 255, 255)),
    ("gold", RGBA::new(255, 215, 0, 255)),
    ("goldenrod", RGBA::new(218, 165, 32, 255)),
    ("gray", RGBA::new(128, 128, 128, 255)),
    ("green", RGBA::new(0, 128, 0, 255)),
    ("greenyellow", RGBA::new(173, 255, 47, 255)),
    ("grey", RGBA::new(128, 128, 128, 255)),
    ("honeydew", RGBA::new(240, 255, 240, 255)),
    ("hotpink", RGBA::new(255, 105, 180, 255)),
    ("indianred", RGBA::new(205, 92, 92, 255)),
    ("indigo", RGBA::new(75, 0, 130, 255)),
    ("ivory", RGBA::new(255, 255, 240, 255)),
    ("khaki", RGBA::new(240, 230, 140, 255)),
    ("lavender", RGBA::new(230, 230, 250, 255)),
    ("lavenderblush", RGBA::new(255, 240, 245, 255)),
    ("lawngreen", RGBA::new(124, 252, 0, 255)),
    ("lemonchiffon", RGBA::new(255, 250, 205, 255)),
    ("lightblue", RGBA::new(173, 216, 230, 255)),
    ("lightcoral", RGBA::new(240, 128, 128, 255)),
    ("lightcyan", RGBA::new(224, 255, 255, 255)),
    ("lightgoldenrodyellow", RGBA::new(250, 250, 210, 255)),
    ("lightgray", RGBA::new(211, 211, 211, 255)),
    ("lightgreen", RGBA::new(144, 238, 144, 255)),
    ("lightgrey", RGBA::new(211, 211, 211, 255)),
    ("lightpink", RGBA::new(255, 182, 193, 255)),
    ("lightsalmon", RGBA::new(255, 160, 122, 255)),
    ("lightseagreen", RGBA::new(32, 178, 170, 255)),
    ("lightskyblue", RGBA::new(135, 206, 250, 255)),
    ("lightslategray", RGBA::new(119, 136, 153, 255)),
    ("lightslategrey", RGBA::new(119, 136, 153, 255)),
    ("lightsteelblue", RGBA::new(176, 196, 222, 255)),
    ("lightyellow", RGBA::new(255, 255, 224, 255)),
    ("lime", RGBA::new(0, 255, 0, 255)),
    ("limegreen", RGBA::new(50, 205, 50, 255)),
    ("linen", RGBA::new(250, 240, 230, 255)),
    ("magenta", RGBA::new(255, 0, 255, 255)),
    ("maroon", RGBA::new(128, 0, 0, 255)),
    ("mediumaquamarine", RGBA::new(102, 205, 170, 255)),
    ("mediumblue", RGBA::new(0, 0, 205, 255)),
    ("mediumorchid", RGBA::new(186, 85, 211, 255)),
    ("mediumpurple", RGBA::new(147, 112, 219, 255)),
    ("mediumseagreen", RGBA::new(60, 179, 113, 255)),
    ("mediumslateblue", RGBA::new(123, 104, 238, 255)),
    ("mediumspringgreen", RGBA::new(0, 250, 154, 255)),
    ("mediumturquoise", RGBA::new(72, 209, 204, 255)),
    ("mediumvioletred", RGBA::new(199, 21, 133, 255)),
    ("midnightblue", RGBA::new(25, 25, 112, 255)),
    ("mintcream", RGBA::new(245, 255, 250, 255)),
    ("mistyrose", RGBA::new(255, 228, 225, 255)),
    ("moccasin", RGBA::new(255, 228, 181, 255)),
    ("navajowhite", RGBA::new(255, 222, 173, 255)),
    ("navy", RGBA::new(0, 0, 128, 255)),
    ("oldlace", RGBA::new(253, 245, 230, 255)),
    ("olive", RGBA::new(128, 128, 0, 255)),
    ("olivedrab", RGBA::new(107, 142, 35, 255)),
    ("orange", RGBA::new(255, 165, 0, 255)),
    ("orangered", RGBA::new(255, 69, 0, 255)),
    ("orchid", RGBA::new(218, 112, 214, 255)),
    ("palegoldenrod", RGBA::new(238, 232, 170, 255)),
    ("palegreen", RGBA::new(152, 251, 152, 255)),
    ("paleturquoise", RGBA::new(175, 238, 238, 255)),
    ("palevioletred", RGBA::new(219, 112, 147, 255)),
    ("papayawhip", RGBA::new(255, 239, 213, 255)),
    ("peachpuff", RGBA::new(255, 218, 185, 255)),
    ("peru", RGBA::new(205, 133, 63, 255)),
    ("pink", RGBA::new(255, 192, 203, 255)),
    ("plum", RGBA::new(221, 160, 221, 255)),
    ("powderblue", RGBA::new(176, 224, 230, 255)),
    ("purple", RGBA::new(128, 0, 128, 255)),
    ("red", RGBA::new(255, 0, 0, 255)),
    ("rosybrown", RGBA::new(188, 143, 143, 255)),
    ("royalblue", RGBA::new(65, 105, 225, 255)),
    ("saddlebrown", RGBA::new(139, 69, 19, 255)),
    ("salmon", RGBA::new(250, 128, 114, 255)),
    ("sandybrown", RGBA::new(244, 164, 96, 255)),
    ("seagreen", RGBA::new(46, 139, 87, 255)),
    ("seashell", RGBA::new(255, 245, 238, 255)),
    ("sienna", RGBA::new(160, 82, 45, 255)),
    ("silver", RGBA::new(192, 192, 192, 255)),
    ("skyblue", RGBA::new(135, 206, 235, 255)),
    ("slateblue", RGBA::new(106, 90, 205, 255)),
    ("slategray", RGBA::new(112, 128, 144, 255)),
    ("slategrey", RGBA::new(112, 128, 144, 255)),
    ("snow", RGBA::new(255, 250, 250, 255)),
    ("springgreen", RGBA::new(0, 255, 127, 255)),
    ("steelblue", RGBA::new(70, 130, 180, 255)),
    ("tan", RGBA::new(210, 180, 140, 255)),
    ("teal", RGBA::new(0, 128, 128, 255)),
    ("thistle", RGBA::new(216, 191, 216, 255)),
    ("tomato", RGBA::new(255, 99, 71, 255)),
    ("transparent", RGBA::new(0, 0, 0, 0)),
    ("turquoise", RGBA::new(64, 224, 208, 255)),
    ("violet", RGBA::new(238, 130, 238, 255)),
    ("wheat", RGBA::new(245, 222, 179, 255)),
    ("white", RGBA::new(255, 255, 255, 255)),
    ("whitesmoke", RGBA::new(245, 245, 245, 255)),
    ("yellow", RGBA::new(255, 255, 0, 255)),
    ("yellowgreen", RGBA::new(154, 205, 50, 255)),
];
