//! Minimal ESC/POS binary command builder for thermal kitchen printers.
//!
//! Generates raw byte sequences that a print dispatcher writes straight to
//! the printer. Supports text formatting, alignment, UTF-8 or ASCII text and
//! paper cutting. Column math treats CJK characters as double width.

// ESC/POS command bytes
const ESC: u8 = 0x1B;
const GS: u8 = 0x1D;
const LF: u8 = 0x0A;

/// Paper width in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaperWidth {
    Mm58,
    Mm80,
}

impl PaperWidth {
    pub fn chars(self) -> usize {
        match self {
            PaperWidth::Mm58 => 32,
            PaperWidth::Mm80 => 48,
        }
    }

    pub fn from_mm(mm: i32) -> Self {
        if mm <= 58 {
            PaperWidth::Mm58
        } else {
            PaperWidth::Mm80
        }
    }
}

/// How text is turned into printer bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// Bytes < 0x80 pass through; everything else becomes `?`.
    Ascii,
    /// UTF-8 passthrough for printers with a UTF-8 font.
    Utf8,
}

/// Terminal-style column width: wide (CJK, fullwidth) characters take two.
pub fn display_width(text: &str) -> usize {
    text.chars().map(char_width).sum()
}

pub fn char_width(ch: char) -> usize {
    let code = ch as u32;
    let wide = matches!(code,
        0x1100..=0x115F
        | 0x2E80..=0x303E
        | 0x3041..=0x33FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xA000..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x20000..=0x2FFFD
        | 0x30000..=0x3FFFD);
    if wide {
        2
    } else {
        1
    }
}

/// Builder for generating ESC/POS binary command buffers.
///
/// ```rust,ignore
/// let mut b = EscPosBuilder::new().with_encoding(TextEncoding::Utf8);
/// b.init()
///     .center()
///     .bold(true).text("廚房工作單\n").bold(false)
///     .left()
///     .line_pair("2x 沙朗牛排", "600")
///     .feed(3)
///     .cut();
/// let data = b.build();
/// ```
pub struct EscPosBuilder {
    buffer: Vec<u8>,
    paper: PaperWidth,
    encoding: TextEncoding,
}

impl Default for EscPosBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EscPosBuilder {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(512),
            paper: PaperWidth::Mm80,
            encoding: TextEncoding::Utf8,
        }
    }

    pub fn with_paper(mut self, paper: PaperWidth) -> Self {
        self.paper = paper;
        self
    }

    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    // -----------------------------------------------------------------------
    // Initialization
    // -----------------------------------------------------------------------

    /// ESC @ — Initialize printer, reset to defaults.
    pub fn init(&mut self) -> &mut Self {
        self.buffer.extend_from_slice(&[ESC, 0x40]);
        self
    }

    // -----------------------------------------------------------------------
    // Text formatting
    // -----------------------------------------------------------------------

    /// ESC E n — Bold on/off.
    pub fn bold(&mut self, on: bool) -> &mut Self {
        self.buffer
            .extend_from_slice(&[ESC, 0x45, if on { 1 } else { 0 }]);
        self
    }

    /// GS ! n — Set text size (width × height multiplier, 1–8 each).
    pub fn text_size(&mut self, width: u8, height: u8) -> &mut Self {
        let w = width.clamp(1, 8) - 1;
        let h = height.clamp(1, 8) - 1;
        self.buffer.extend_from_slice(&[GS, 0x21, (w << 4) | h]);
        self
    }

    /// Reset text size to 1×1.
    pub fn normal_size(&mut self) -> &mut Self {
        self.text_size(1, 1)
    }

    /// Double-height text (1×2).
    pub fn double_height(&mut self) -> &mut Self {
        self.text_size(1, 2)
    }

    /// Double width and height (2×2).
    pub fn double_size(&mut self) -> &mut Self {
        self.text_size(2, 2)
    }

    // -----------------------------------------------------------------------
    // Alignment
    // -----------------------------------------------------------------------

    /// ESC a 0 — Left-align.
    pub fn left(&mut self) -> &mut Self {
        self.buffer.extend_from_slice(&[ESC, 0x61, 0]);
        self
    }

    /// ESC a 1 — Centre-align.
    pub fn center(&mut self) -> &mut Self {
        self.buffer.extend_from_slice(&[ESC, 0x61, 1]);
        self
    }

    /// ESC a 2 — Right-align.
    pub fn right(&mut self) -> &mut Self {
        self.buffer.extend_from_slice(&[ESC, 0x61, 2]);
        self
    }

    // -----------------------------------------------------------------------
    // Text output
    // -----------------------------------------------------------------------

    /// Append text in the configured encoding.
    pub fn text(&mut self, s: &str) -> &mut Self {
        match self.encoding {
            TextEncoding::Utf8 => self.buffer.extend_from_slice(s.as_bytes()),
            TextEncoding::Ascii => {
                for ch in s.chars() {
                    let code = ch as u32;
                    if code < 0x80 {
                        self.buffer.push(code as u8);
                    } else {
                        self.buffer.push(b'?');
                    }
                }
            }
        }
        self
    }

    /// Append a line-feed.
    pub fn lf(&mut self) -> &mut Self {
        self.buffer.push(LF);
        self
    }

    /// Print a horizontal separator using dashes, matching paper width.
    pub fn separator(&mut self) -> &mut Self {
        let width = self.paper.chars();
        self.buffer.extend(std::iter::repeat(b'-').take(width));
        self.buffer.push(LF);
        self
    }

    /// Print a line with left-aligned label and right-aligned value.
    pub fn line_pair(&mut self, label: &str, value: &str) -> &mut Self {
        let width = self.paper.chars();
        let gap = width
            .saturating_sub(display_width(label) + display_width(value))
            .max(1);
        self.text(label);
        self.buffer.extend(std::iter::repeat(b' ').take(gap));
        self.text(value);
        self.lf()
    }

    // -----------------------------------------------------------------------
    // Feed / cut
    // -----------------------------------------------------------------------

    /// ESC d n — Feed n lines.
    pub fn feed(&mut self, lines: u8) -> &mut Self {
        self.buffer.extend_from_slice(&[ESC, 0x64, lines]);
        self
    }

    /// GS V A 16 — Partial cut with 16-dot feed.
    pub fn cut(&mut self) -> &mut Self {
        self.buffer.extend_from_slice(&[GS, 0x56, 0x41, 0x10]);
        self
    }

    // -----------------------------------------------------------------------
    // Build
    // -----------------------------------------------------------------------

    /// Consume the builder and return the binary ESC/POS payload.
    pub fn build(self) -> Vec<u8> {
        self.buffer
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
