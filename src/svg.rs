//! SVG output surface
//!
//! Records drawing calls as SVG elements. Each `set_transform` opens a new
//! `<g>` group carrying the viewport transform.

use std::fmt::Write;

use crate::render::{Stroke, Surface};
use crate::viewport::BoundingBox;

/// A [`Surface`] that produces an SVG document
#[derive(Debug, Clone)]
pub struct SvgSurface {
    width: f32,
    height: f32,
    body: String,
    group_open: bool,
}

impl SvgSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            body: String::new(),
            group_open: false,
        }
    }

    /// Close any open group and return the complete document
    pub fn finish(mut self) -> String {
        self.close_group();
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n{body}</svg>\n",
            w = self.width,
            h = self.height,
            body = self.body
        )
    }

    fn close_group(&mut self) {
        if self.group_open {
            self.body.push_str("</g>\n");
            self.group_open = false;
        }
    }
}

fn stroke_attrs(stroke: Option<Stroke<'_>>) -> String {
    match stroke {
        Some(s) => format!(" stroke=\"{}\" stroke-width=\"{}\"", escape(s.color), s.width),
        None => String::new(),
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

impl Surface for SvgSurface {
    fn size(&self) -> Option<(f32, f32)> {
        Some((self.width, self.height))
    }

    fn clear(&mut self, color: &str) {
        self.close_group();
        self.body.clear();
        let _ = writeln!(
            self.body,
            "<rect width=\"{}\" height=\"{}\" fill=\"{}\"/>",
            self.width,
            self.height,
            escape(color)
        );
    }

    fn set_transform(&mut self, pan_x: f32, pan_y: f32, zoom: f32) {
        self.close_group();
        let _ = writeln!(
            self.body,
            "<g transform=\"translate({pan_x} {pan_y}) scale({zoom})\">"
        );
        self.group_open = true;
    }

    fn line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: &str) {
        let _ = writeln!(
            self.body,
            "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{}\" stroke-width=\"{}\"/>",
            from.0,
            from.1,
            to.0,
            to.1,
            escape(color),
            width
        );
    }

    fn circle(&mut self, center: (f32, f32), radius: f32, fill: &str, stroke: Option<Stroke<'_>>) {
        let _ = writeln!(
            self.body,
            "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"{}\"{}/>",
            center.0,
            center.1,
            radius,
            escape(fill),
            stroke_attrs(stroke)
        );
    }

    fn rect(&mut self, rect: &BoundingBox, fill: &str, stroke: Option<Stroke<'_>>) {
        let _ = writeln!(
            self.body,
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\"{}/>",
            rect.min_x,
            rect.min_y,
            rect.max_x - rect.min_x,
            rect.max_y - rect.min_y,
            escape(fill),
            stroke_attrs(stroke)
        );
    }

    fn text(&mut self, at: (f32, f32), text: &str, size: f32, color: &str) {
        let _ = writeln!(
            self.body,
            "<text x=\"{}\" y=\"{}\" font-size=\"{}\" fill=\"{}\" dominant-baseline=\"middle\" font-family=\"sans-serif\">{}</text>",
            at.0,
            at.1,
            size,
            escape(color),
            escape(text)
        );
    }
}
