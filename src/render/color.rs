//! CSS-style color and gradient expressions as produced by the model.

use image::Rgba;

/// Where a stop sits on the gradient line, before resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StopPosition {
    Auto,
    /// Percentage as a fraction of the gradient length.
    Fraction(f32),
    Pixels(f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub color: Rgba<u8>,
    pub position: StopPosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadialShape {
    Circle,
    Ellipse,
}

/// How far a radial gradient's ending shape reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadialExtent {
    ClosestSide,
    FarthestSide,
    ClosestCorner,
    FarthestCorner,
}

/// Fill for the card background.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Rgba<u8>),
    LinearGradient {
        /// CSS angle: 0 points up, 90 points right.
        angle_deg: f32,
        stops: Vec<ColorStop>,
    },
    RadialGradient {
        shape: RadialShape,
        extent: RadialExtent,
        /// Center as fractions of width and height.
        center: (f32, f32),
        stops: Vec<ColorStop>,
    },
}

const NAMED_COLORS: &[(&str, [u8; 4])] = &[
    ("transparent", [0, 0, 0, 0]),
    ("black", [0, 0, 0, 255]),
    ("white", [255, 255, 255, 255]),
    ("red", [255, 0, 0, 255]),
    ("green", [0, 128, 0, 255]),
    ("lime", [0, 255, 0, 255]),
    ("blue", [0, 0, 255, 255]),
    ("yellow", [255, 255, 0, 255]),
    ("orange", [255, 165, 0, 255]),
    ("purple", [128, 0, 128, 255]),
    ("pink", [255, 192, 203, 255]),
    ("gold", [255, 215, 0, 255]),
    ("navy", [0, 0, 128, 255]),
    ("gray", [128, 128, 128, 255]),
    ("grey", [128, 128, 128, 255]),
    ("silver", [192, 192, 192, 255]),
    ("cyan", [0, 255, 255, 255]),
    ("magenta", [255, 0, 255, 255]),
];

fn hex_digit(c: char) -> Option<u8> {
    c.to_digit(16).map(|d| d as u8)
}

fn parse_hex(hex: &str) -> Option<Rgba<u8>> {
    let digits: Vec<u8> = hex.chars().map(hex_digit).collect::<Option<_>>()?;
    let channels: Vec<u8> = match digits.len() {
        3 | 4 => digits.iter().map(|d| d * 17).collect(),
        6 | 8 => digits.chunks(2).map(|pair| pair[0] * 16 + pair[1]).collect(),
        _ => return None,
    };
    let alpha = channels.get(3).copied().unwrap_or(255);
    Some(Rgba([channels[0], channels[1], channels[2], alpha]))
}

fn parse_rgb_function(args: &str, with_alpha: bool) -> Option<Rgba<u8>> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    let expected = if with_alpha { 4 } else { 3 };
    if parts.len() != expected {
        return None;
    }

    let mut rgb = [0u8; 3];
    for (slot, part) in rgb.iter_mut().zip(&parts) {
        let value: f32 = part.parse().ok()?;
        *slot = value.round().clamp(0.0, 255.0) as u8;
    }

    let alpha = match parts.get(3) {
        Some(a) => {
            let value: f32 = a.parse().ok()?;
            (value.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        None => 255,
    };

    Some(Rgba([rgb[0], rgb[1], rgb[2], alpha]))
}

/// Parse a single color: hex, `rgb()`/`rgba()`, or a common named color.
pub fn parse_color(expr: &str) -> Option<Rgba<u8>> {
    let expr = expr.trim();
    if let Some(hex) = expr.strip_prefix('#') {
        return parse_hex(hex);
    }

    let lower = expr.to_ascii_lowercase();
    if let Some(args) = lower.strip_prefix("rgba(").and_then(|s| s.strip_suffix(')')) {
        return parse_rgb_function(args, true);
    }
    if let Some(args) = lower.strip_prefix("rgb(").and_then(|s| s.strip_suffix(')')) {
        return parse_rgb_function(args, false);
    }

    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, rgba)| Rgba(*rgba))
}

/// Split on commas that are not nested inside parentheses.
fn split_top_level(args: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in args.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(args[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(args[start..].trim());
    parts
}

fn parse_direction(arg: &str) -> Option<f32> {
    if let Some(deg) = arg.strip_suffix("deg") {
        return deg.trim().parse().ok();
    }
    match arg {
        "to top" => Some(0.0),
        "to top right" | "to right top" => Some(45.0),
        "to right" => Some(90.0),
        "to bottom right" | "to right bottom" => Some(135.0),
        "to bottom" => Some(180.0),
        "to bottom left" | "to left bottom" => Some(225.0),
        "to left" => Some(270.0),
        "to top left" | "to left top" => Some(315.0),
        _ => None,
    }
}

fn parse_offset(token: &str) -> Option<StopPosition> {
    if let Some(pct) = token.strip_suffix('%') {
        return pct.parse::<f32>().ok().map(|p| StopPosition::Fraction(p / 100.0));
    }
    if let Some(px) = token.strip_suffix("px") {
        return px.parse::<f32>().ok().map(StopPosition::Pixels);
    }
    (token.parse::<f32>().ok()? == 0.0).then_some(StopPosition::Fraction(0.0))
}

/// `<color> [<percentage> | <length>px]`
fn parse_stop(arg: &str) -> Option<ColorStop> {
    if let Some((color, token)) = arg.rsplit_once(char::is_whitespace) {
        if let (Some(position), Some(color)) = (parse_offset(token), parse_color(color)) {
            return Some(ColorStop { color, position });
        }
    }
    Some(ColorStop {
        color: parse_color(arg)?,
        position: StopPosition::Auto,
    })
}

fn parse_stops(parts: &[&str]) -> Option<Vec<ColorStop>> {
    let stops: Vec<ColorStop> = parts.iter().map(|p| parse_stop(p)).collect::<Option<_>>()?;
    (!stops.is_empty()).then_some(stops)
}

/// A single stop paints a solid color.
fn gradient_or_solid(stops: Vec<ColorStop>, gradient: impl FnOnce(Vec<ColorStop>) -> Paint) -> Paint {
    if stops.len() == 1 {
        Paint::Solid(stops[0].color)
    } else {
        gradient(stops)
    }
}

fn parse_linear_gradient(args: &str) -> Option<Paint> {
    let mut parts = split_top_level(args);
    let angle_deg = match parts.first().and_then(|first| parse_direction(first)) {
        Some(angle) => {
            parts.remove(0);
            angle
        }
        None => 180.0,
    };

    let stops = parse_stops(&parts)?;
    Some(gradient_or_solid(stops, |stops| Paint::LinearGradient { angle_deg, stops }))
}

fn parse_center(position: &str) -> Option<(f32, f32)> {
    let axis = |token: &str| -> Option<(Option<f32>, Option<f32>)> {
        match token {
            "left" => Some((Some(0.0), None)),
            "right" => Some((Some(1.0), None)),
            "top" => Some((None, Some(0.0))),
            "bottom" => Some((None, Some(1.0))),
            "center" => Some((None, None)),
            _ => {
                let pct: f32 = token.strip_suffix('%')?.parse().ok()?;
                Some((Some(pct / 100.0), None))
            }
        }
    };

    let tokens: Vec<&str> = position.split_whitespace().collect();
    match tokens.as_slice() {
        [one] => {
            let (x, y) = axis(one)?;
            Some((x.unwrap_or(0.5), y.unwrap_or(0.5)))
        }
        [first, second] => {
            let (x1, y1) = axis(first)?;
            let (x2, y2) = axis(second)?;
            match (x1, y1) {
                // `top left` and friends name the vertical keyword first.
                (None, Some(y)) => Some((x2.unwrap_or(0.5), y)),
                _ => {
                    let y = match (x2, y2) {
                        (_, Some(y)) => y,
                        (Some(pct), None) => pct,
                        (None, None) => 0.5,
                    };
                    Some((x1.unwrap_or(0.5), y))
                }
            }
        }
        _ => None,
    }
}

/// `[<shape> || <extent>] [at <position>]`
fn parse_radial_prelude(arg: &str) -> Option<(RadialShape, RadialExtent, (f32, f32))> {
    let (shape_size, position) = match arg.strip_prefix("at ") {
        Some(position) => ("", Some(position)),
        None => match arg.split_once(" at ") {
            Some((shape_size, position)) => (shape_size, Some(position)),
            None => (arg, None),
        },
    };

    let mut shape = RadialShape::Ellipse;
    let mut extent = RadialExtent::FarthestCorner;
    for token in shape_size.split_whitespace() {
        match token {
            "circle" => shape = RadialShape::Circle,
            "ellipse" => shape = RadialShape::Ellipse,
            "closest-side" => extent = RadialExtent::ClosestSide,
            "farthest-side" => extent = RadialExtent::FarthestSide,
            "closest-corner" => extent = RadialExtent::ClosestCorner,
            "farthest-corner" => extent = RadialExtent::FarthestCorner,
            _ => return None,
        }
    }

    let center = match position {
        Some(position) => parse_center(position.trim())?,
        None => (0.5, 0.5),
    };
    Some((shape, extent, center))
}

fn parse_radial_gradient(args: &str) -> Option<Paint> {
    let mut parts = split_top_level(args);
    let (shape, extent, center) = match parts.first().and_then(|first| parse_radial_prelude(first)) {
        Some(prelude) => {
            parts.remove(0);
            prelude
        }
        None => (RadialShape::Ellipse, RadialExtent::FarthestCorner, (0.5, 0.5)),
    };

    let stops = parse_stops(&parts)?;
    Some(gradient_or_solid(stops, |stops| Paint::RadialGradient {
        shape,
        extent,
        center,
        stops,
    }))
}

fn function_args<'a>(lower: &'a str, name: &str) -> Option<&'a str> {
    lower
        .strip_prefix(name)
        .and_then(|rest| rest.strip_prefix('('))
        .and_then(|rest| rest.strip_suffix(')'))
}

/// Parse a background expression: a color, a `linear-gradient(...)` or a
/// `radial-gradient(...)`.
pub fn parse_paint(expr: &str) -> Option<Paint> {
    let trimmed = expr.trim().trim_end_matches(';').trim();
    let lower = trimmed.to_ascii_lowercase();

    if let Some(args) = function_args(&lower, "linear-gradient") {
        return parse_linear_gradient(args);
    }
    if let Some(args) = function_args(&lower, "radial-gradient") {
        return parse_radial_gradient(args);
    }

    parse_color(trimmed).map(Paint::Solid)
}

/// Resolve stop positions to fractions of a gradient `length` pixels long:
/// missing ends become 0 and 1, every stop is pulled up to the largest
/// position before it, and runs of unpositioned stops are spread evenly.
pub fn resolve_stops(stops: &[ColorStop], length: f32) -> Vec<(Rgba<u8>, f32)> {
    let mut positions: Vec<Option<f32>> = stops
        .iter()
        .map(|stop| match stop.position {
            StopPosition::Auto => None,
            StopPosition::Fraction(f) => Some(f),
            StopPosition::Pixels(px) if length > f32::EPSILON => Some(px / length),
            StopPosition::Pixels(_) => Some(0.0),
        })
        .collect();

    let n = positions.len();
    if n == 0 {
        return Vec::new();
    }
    positions[0].get_or_insert(0.0);
    positions[n - 1].get_or_insert(1.0);

    let mut highest = f32::NEG_INFINITY;
    for position in positions.iter_mut().flatten() {
        if *position < highest {
            *position = highest;
        } else {
            highest = *position;
        }
    }

    let mut i = 1;
    while i < n {
        if positions[i].is_some() {
            i += 1;
            continue;
        }
        let start = i - 1;
        let end = (i..n).find(|&j| positions[j].is_some()).unwrap_or(n - 1);
        let from = positions[start].unwrap_or(0.0);
        let to = positions[end].unwrap_or(1.0);
        let steps = (end - start) as f32;
        for (k, slot) in positions.iter_mut().enumerate().take(end).skip(i) {
            *slot = Some(from + (to - from) * (k - start) as f32 / steps);
        }
        i = end + 1;
    }

    stops
        .iter()
        .zip(positions)
        .map(|(stop, position)| (stop.color, position.unwrap_or(0.0)))
        .collect()
}

fn lerp_channel(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t).round() as u8
}

fn sample_stops(stops: &[(Rgba<u8>, f32)], t: f32) -> Rgba<u8> {
    let (first_color, first_position) = stops[0];
    if t <= first_position {
        return first_color;
    }
    for pair in stops.windows(2) {
        let ((from_color, from), (to_color, to)) = (pair[0], pair[1]);
        if t <= to {
            let span = to - from;
            let local = if span <= f32::EPSILON {
                1.0
            } else {
                (t - from) / span
            };
            let mut out = [0u8; 4];
            for (c, slot) in out.iter_mut().enumerate() {
                *slot = lerp_channel(from_color.0[c], to_color.0[c], local);
            }
            return Rgba(out);
        }
    }
    stops[stops.len() - 1].0
}

#[derive(Debug, Clone, Copy)]
enum Geometry {
    Linear {
        dx: f32,
        dy: f32,
        line_length: f32,
    },
    Radial {
        cx: f32,
        cy: f32,
        rx: f32,
        ry: f32,
    },
}

/// A paint laid out on a surface of fixed size, ready for per-pixel sampling.
#[derive(Debug, Clone)]
pub struct Shader {
    width: f32,
    height: f32,
    solid: Option<Rgba<u8>>,
    geometry: Option<Geometry>,
    stops: Vec<(Rgba<u8>, f32)>,
}

fn radial_radii(shape: RadialShape, extent: RadialExtent, cx: f32, cy: f32, w: f32, h: f32) -> (f32, f32) {
    let (near_x, far_x) = (cx.min(w - cx).max(0.0), cx.max(w - cx).max(0.0));
    let (near_y, far_y) = (cy.min(h - cy).max(0.0), cy.max(h - cy).max(0.0));

    match shape {
        RadialShape::Circle => {
            let r = match extent {
                RadialExtent::ClosestSide => near_x.min(near_y),
                RadialExtent::FarthestSide => far_x.max(far_y),
                RadialExtent::ClosestCorner => near_x.hypot(near_y),
                RadialExtent::FarthestCorner => far_x.hypot(far_y),
            };
            (r, r)
        }
        RadialShape::Ellipse => match extent {
            RadialExtent::ClosestSide => (near_x, near_y),
            RadialExtent::FarthestSide => (far_x, far_y),
            RadialExtent::ClosestCorner => (near_x * std::f32::consts::SQRT_2, near_y * std::f32::consts::SQRT_2),
            RadialExtent::FarthestCorner => (far_x * std::f32::consts::SQRT_2, far_y * std::f32::consts::SQRT_2),
        },
    }
}

impl Paint {
    /// Lay the paint out on a `width` × `height` surface.
    pub fn shader(&self, width: u32, height: u32) -> Shader {
        let (w, h) = (width as f32, height as f32);
        let mut shader = Shader {
            width: w,
            height: h,
            solid: None,
            geometry: None,
            stops: Vec::new(),
        };

        match self {
            Paint::Solid(color) => shader.solid = Some(*color),
            Paint::LinearGradient { angle_deg, stops } => {
                let radians = angle_deg.to_radians();
                let (dx, dy) = (radians.sin(), -radians.cos());
                let line_length = (w * dx).abs() + (h * dy).abs();
                shader.stops = resolve_stops(stops, line_length);
                shader.geometry = Some(Geometry::Linear { dx, dy, line_length });
            }
            Paint::RadialGradient {
                shape,
                extent,
                center,
                stops,
            } => {
                let (cx, cy) = (center.0 * w, center.1 * h);
                let (rx, ry) = radial_radii(*shape, *extent, cx, cy, w, h);
                shader.stops = resolve_stops(stops, rx);
                shader.geometry = Some(Geometry::Radial { cx, cy, rx, ry });
            }
        }
        shader
    }

    /// Color at pixel center (`x`, `y`) on a `width` × `height` surface.
    pub fn sample(&self, x: u32, y: u32, width: u32, height: u32) -> Rgba<u8> {
        self.shader(width, height).sample(x, y)
    }
}

impl Shader {
    pub fn sample(&self, x: u32, y: u32) -> Rgba<u8> {
        if let Some(color) = self.solid {
            return color;
        }
        let (Some(geometry), false) = (self.geometry, self.stops.is_empty()) else {
            return Rgba([0, 0, 0, 0]);
        };

        let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
        let t = match geometry {
            Geometry::Linear { dx, dy, line_length } => {
                if line_length <= f32::EPSILON {
                    0.0
                } else {
                    let (px, py) = (px - self.width / 2.0, py - self.height / 2.0);
                    (px * dx + py * dy) / line_length + 0.5
                }
            }
            Geometry::Radial { cx, cy, rx, ry } => {
                if rx <= f32::EPSILON || ry <= f32::EPSILON {
                    return self.stops[self.stops.len() - 1].0;
                }
                ((px - cx) / rx).hypot((py - cy) / ry)
            }
        };
        sample_stops(&self.stops, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_forms() {
        assert_eq!(parse_color("#fff"), Some(Rgba([255, 255, 255, 255])));
        assert_eq!(parse_color("#ff1744"), Some(Rgba([0xff, 0x17, 0x44, 255])));
        assert_eq!(parse_color("#00000080"), Some(Rgba([0, 0, 0, 0x80])));
        assert_eq!(parse_color("#f008"), Some(Rgba([255, 0, 0, 0x88])));
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("#zzz"), None);
    }

    #[test]
    fn test_parse_rgb_functions_and_names() {
        assert_eq!(parse_color("rgb(10, 20, 30)"), Some(Rgba([10, 20, 30, 255])));
        assert_eq!(parse_color("RGBA(0,0,0,0.5)"), Some(Rgba([0, 0, 0, 128])));
        assert_eq!(parse_color("White"), Some(Rgba([255, 255, 255, 255])));
        assert_eq!(parse_color("chartreuse-ish"), None);
    }

    #[test]
    fn test_parse_gradient() {
        let paint = parse_paint("linear-gradient(45deg, #667eea 0%, #764ba2 100%)").unwrap();
        match paint {
            Paint::LinearGradient { angle_deg, stops } => {
                assert_eq!(angle_deg, 45.0);
                assert_eq!(stops.len(), 2);
                assert_eq!(stops[0].color, Rgba([0x66, 0x7e, 0xea, 255]));
                assert_eq!(stops[1].position, StopPosition::Fraction(1.0));
            }
            other => panic!("unexpected paint: {:?}", other),
        }
    }

    #[test]
    fn test_gradient_defaults_direction_and_positions() {
        let paint = parse_paint("linear-gradient(red, rgba(0, 0, 255, 1), white)").unwrap();
        match paint {
            Paint::LinearGradient { angle_deg, stops } => {
                assert_eq!(angle_deg, 180.0);
                let positions: Vec<f32> = resolve_stops(&stops, 100.0).iter().map(|s| s.1).collect();
                assert_eq!(positions, vec![0.0, 0.5, 1.0]);
            }
            other => panic!("unexpected paint: {:?}", other),
        }
    }

    #[test]
    fn test_unparseable_paint() {
        assert_eq!(parse_paint("a sunset photo"), None);
        assert_eq!(parse_paint("linear-gradient(to right, nope, #fff)"), None);
    }

    #[test]
    fn test_gradient_sampling_runs_left_to_right() {
        let paint = parse_paint("linear-gradient(to right, #000000, #ffffff)").unwrap();
        let left = paint.sample(0, 10, 100, 20);
        let right = paint.sample(99, 10, 100, 20);
        assert!(left.0[0] < 10);
        assert!(right.0[0] > 245);
    }

    fn positions(expr: &str, length: f32) -> Vec<f32> {
        match parse_paint(expr).unwrap() {
            Paint::LinearGradient { stops, .. } | Paint::RadialGradient { stops, .. } => {
                resolve_stops(&stops, length).iter().map(|s| s.1).collect()
            }
            other => panic!("unexpected paint: {:?}", other),
        }
    }

    #[test]
    fn test_pixel_stops_resolve_against_gradient_length() {
        assert_eq!(
            positions("linear-gradient(to right, #000 0px, #fff 200px)", 400.0),
            vec![0.0, 0.5]
        );
        let paint = parse_paint("linear-gradient(to right, #000000 0px, #ffffff 640px)").unwrap();
        assert_eq!(paint.sample(1279, 0, 1280, 720), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_stop_positions_never_decrease() {
        assert_eq!(
            positions("linear-gradient(red 60%, blue 20%, white)", 100.0),
            vec![0.6, 0.6, 1.0]
        );
        assert_eq!(
            positions("linear-gradient(red, lime 80%, blue, navy 40%, white)", 100.0),
            vec![0.0, 0.8, 0.8, 0.8, 1.0]
        );
    }

    #[test]
    fn test_radial_gradient_center_to_edge() {
        let paint = parse_paint("radial-gradient(circle at center, #ffffff 0%, #000000 100%)").unwrap();
        assert!(matches!(
            paint,
            Paint::RadialGradient {
                shape: RadialShape::Circle,
                ..
            }
        ));
        let center = paint.sample(640, 360, 1280, 720);
        let corner = paint.sample(0, 0, 1280, 720);
        assert!(center.0[0] > 250);
        assert!(corner.0[0] < 5);
    }

    #[test]
    fn test_radial_gradient_prelude_forms() {
        match parse_paint("radial-gradient(#ff0000, #0000ff)").unwrap() {
            Paint::RadialGradient { extent, center, .. } => {
                assert_eq!(extent, RadialExtent::FarthestCorner);
                assert_eq!(center, (0.5, 0.5));
            }
            other => panic!("unexpected paint: {:?}", other),
        }

        match parse_paint("radial-gradient(ellipse closest-side at top left, red, blue 50px)").unwrap() {
            Paint::RadialGradient {
                shape,
                extent,
                center,
                ..
            } => {
                assert_eq!(shape, RadialShape::Ellipse);
                assert_eq!(extent, RadialExtent::ClosestSide);
                assert_eq!(center, (0.0, 0.0));
            }
            other => panic!("unexpected paint: {:?}", other),
        }

        assert_eq!(parse_paint("radial-gradient(200px at 10% 20%, red, blue)"), None);
    }
}
