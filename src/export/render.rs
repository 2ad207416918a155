//! Markdown → raster rendering for PDF export.
//!
//! The committed report is parsed with `pulldown-cmark` into styled blocks
//! (headings, paragraphs, list items, rules), word-wrapped to a fixed logical
//! width and drawn with the `font8x8` bitmap glyphs into an [`RgbImage`].
//! Every dimension is multiplied by the capture scale, so a scale of 2 yields
//! a supersampled raster with crisp glyph edges.

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{Rgb, RgbImage};
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag};

use crate::contract::RenderTarget;

/// Logical canvas width, in pixels at scale 1.
pub const CANVAS_WIDTH: u32 = 640;
const MARGIN: u32 = 24;
const GLYPH: u32 = 8;
const LIST_INDENT: u32 = 2;

const INK: Rgb<u8> = Rgb([17, 24, 39]);
const MUTED: Rgb<u8> = Rgb([156, 163, 175]);
const PAPER: Rgb<u8> = Rgb([255, 255, 255]);

/// Glyph magnification relative to body text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSize {
    Body,
    Subheading,
    Heading,
}

impl TextSize {
    fn glyph_scale(self) -> u32 {
        match self {
            TextSize::Body => 1,
            TextSize::Subheading | TextSize::Heading => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Text {
        size: TextSize,
        indent: u32,
        runs: Vec<Run>,
    },
    Rule,
    Gap,
}

#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<Block>,
    runs: Vec<Run>,
    size: Option<TextSize>,
    bold: bool,
    indent: u32,
    lists: Vec<Option<u64>>,
}

impl BlockBuilder {
    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.runs.last_mut() {
            Some(last) if last.bold == self.bold => last.text.push_str(text),
            _ => self.runs.push(Run {
                text: text.to_string(),
                bold: self.bold,
            }),
        }
    }

    fn flush(&mut self) {
        if self.runs.iter().all(|r| r.text.trim().is_empty()) {
            self.runs.clear();
            return;
        }
        self.blocks.push(Block::Text {
            size: self.size.unwrap_or(TextSize::Body),
            indent: self.indent,
            runs: std::mem::take(&mut self.runs),
        });
    }

    fn gap(&mut self) {
        if !matches!(self.blocks.last(), None | Some(Block::Gap)) {
            self.blocks.push(Block::Gap);
        }
    }
}

/// Parses Markdown into drawable blocks.
pub fn layout_markdown(markdown: &str) -> Vec<Block> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let mut b = BlockBuilder::default();

    for event in Parser::new_ext(markdown, options) {
        match event {
            Event::Start(tag) => match tag {
                Tag::Heading(level, _, _) => {
                    b.flush();
                    b.size = Some(match level {
                        HeadingLevel::H1 => TextSize::Heading,
                        _ => TextSize::Subheading,
                    });
                    b.bold = true;
                }
                // Loose list items wrap their text in a paragraph; keep the marker.
                Tag::Paragraph if b.lists.is_empty() => b.flush(),
                Tag::List(start) => {
                    b.flush();
                    b.lists.push(start);
                    b.indent = b.lists.len() as u32 * LIST_INDENT;
                }
                Tag::Item => {
                    b.flush();
                    let marker = match b.lists.last_mut() {
                        Some(Some(n)) => {
                            let m = format!("{n}. ");
                            *n += 1;
                            m
                        }
                        _ => "- ".to_string(),
                    };
                    b.push_text(&marker);
                }
                Tag::Strong => b.bold = true,
                _ => {}
            },
            Event::End(tag) => match tag {
                Tag::Heading(..) => {
                    b.flush();
                    b.size = None;
                    b.bold = false;
                    b.gap();
                }
                Tag::Paragraph => {
                    b.flush();
                    if b.lists.is_empty() {
                        b.gap();
                    }
                }
                Tag::Item => b.flush(),
                Tag::List(_) => {
                    b.flush();
                    b.lists.pop();
                    b.indent = b.lists.len() as u32 * LIST_INDENT;
                    if b.lists.is_empty() {
                        b.gap();
                    }
                }
                Tag::Strong => b.bold = false,
                Tag::CodeBlock(_) => b.gap(),
                _ => {}
            },
            Event::Text(text) | Event::Code(text) => {
                let mut lines = text.split('\n').peekable();
                while let Some(line) = lines.next() {
                    b.push_text(line);
                    if lines.peek().is_some() {
                        b.flush();
                    }
                }
            }
            Event::SoftBreak => b.push_text(" "),
            Event::HardBreak => b.flush(),
            Event::Rule => {
                b.flush();
                b.blocks.push(Block::Rule);
                b.gap();
            }
            _ => {}
        }
    }
    b.flush();
    while matches!(b.blocks.last(), Some(Block::Gap)) {
        b.blocks.pop();
    }
    b.blocks
}

type Cell = (char, bool);

/// Greedy word wrap on spaces; words longer than a line are hard-split.
fn wrap(cells: &[Cell], max_cols: usize) -> Vec<Vec<Cell>> {
    let max_cols = max_cols.max(1);
    let mut lines = Vec::new();
    let mut start = 0;
    while start < cells.len() {
        if !lines.is_empty() {
            while start < cells.len() && cells[start].0 == ' ' {
                start += 1;
            }
            if start >= cells.len() {
                break;
            }
        }
        let end = (start + max_cols).min(cells.len());
        if end == cells.len() {
            lines.push(cells[start..end].to_vec());
            break;
        }
        let brk = cells[start..=end]
            .iter()
            .rposition(|(c, _)| *c == ' ')
            .map(|p| start + p)
            .filter(|&p| p > start)
            .unwrap_or(end);
        lines.push(cells[start..brk].to_vec());
        start = brk;
    }
    lines
}

enum Line {
    Text { glyph: u32, indent_px: u32, cells: Vec<Cell> },
    Rule,
    Gap,
}

impl Line {
    fn height(&self) -> u32 {
        match self {
            Line::Text { glyph, .. } => glyph * GLYPH * 3 / 2,
            Line::Rule => GLYPH * 2,
            Line::Gap => GLYPH,
        }
    }
}

fn glyph_for(ch: char) -> Option<[u8; 8]> {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
}

fn draw_glyph(img: &mut RgbImage, x: u32, y: u32, ch: char, px: u32, bold: bool) {
    let Some(glyph) = glyph_for(ch) else {
        return;
    };
    let strikes: &[u32] = if bold { &[0, 1] } else { &[0] };
    for (row_idx, row) in glyph.iter().copied().enumerate() {
        for col in 0..8u32 {
            if (row >> col) & 1 == 0 {
                continue;
            }
            for &dx in strikes {
                let x0 = x + col * px + dx * (px / 2).max(1);
                let y0 = y + row_idx as u32 * px;
                for sy in 0..px {
                    for sx in 0..px {
                        let (tx, ty) = (x0 + sx, y0 + sy);
                        if tx < img.width() && ty < img.height() {
                            img.put_pixel(tx, ty, INK);
                        }
                    }
                }
            }
        }
    }
}

/// Draws `blocks` into a raster at `scale`× the logical canvas size.
pub fn rasterize(blocks: &[Block], scale: u32) -> Option<RgbImage> {
    let scale = scale.max(1);
    let content_width = CANVAS_WIDTH - 2 * MARGIN;

    let mut lines = Vec::new();
    for block in blocks {
        match block {
            Block::Text { size, indent, runs } => {
                let glyph = size.glyph_scale();
                let indent_px = indent * GLYPH;
                let cols = ((content_width - indent_px.min(content_width)) / (GLYPH * glyph)) as usize;
                let cells: Vec<Cell> = runs
                    .iter()
                    .flat_map(|r| r.text.chars().map(move |c| (c, r.bold)))
                    .collect();
                for cells in wrap(&cells, cols) {
                    lines.push(Line::Text { glyph, indent_px, cells });
                }
            }
            Block::Rule => lines.push(Line::Rule),
            Block::Gap => lines.push(Line::Gap),
        }
    }
    if lines.is_empty() {
        return None;
    }

    let height: u32 = 2 * MARGIN + lines.iter().map(Line::height).sum::<u32>();
    let mut img = RgbImage::from_pixel(CANVAS_WIDTH * scale, height * scale, PAPER);

    let mut y = MARGIN;
    for line in &lines {
        match line {
            Line::Text { glyph, indent_px, cells } => {
                let px = glyph * scale;
                let top = y + (line.height() - glyph * GLYPH) / 2;
                for (i, (ch, bold)) in cells.iter().enumerate() {
                    let x = MARGIN + indent_px + i as u32 * GLYPH * glyph;
                    draw_glyph(&mut img, x * scale, top * scale, *ch, px, *bold);
                }
            }
            Line::Rule => {
                let ry = (y + GLYPH) * scale;
                for x in (MARGIN * scale)..((CANVAS_WIDTH - MARGIN) * scale) {
                    for t in 0..scale {
                        img.put_pixel(x, ry + t, MUTED);
                    }
                }
            }
            Line::Gap => {}
        }
        y += line.height();
    }
    Some(img)
}

/// The committed report as a renderable region.
pub struct MarkdownCanvas<'a> {
    markdown: &'a str,
}

impl<'a> MarkdownCanvas<'a> {
    pub fn new(markdown: &'a str) -> Self {
        Self { markdown }
    }
}

impl RenderTarget for MarkdownCanvas<'_> {
    fn capture(&self, scale: u32) -> Option<RgbImage> {
        if self.markdown.trim().is_empty() {
            return None;
        }
        rasterize(&layout_markdown(self.markdown), scale)
    }
}
