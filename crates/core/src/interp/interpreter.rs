//! Executes page content streams against a [`TextDevice`].
//!
//! Only the operators that affect text geometry are interpreted: the
//! graphics stack, CTM changes, the text state and positioning family,
//! the show operators, and Form XObject invocation. Painting operators
//! are accepted and ignored.

use crate::document::catalog::Document;
use crate::document::page::Page;
use crate::error::{PdfError, Result};
use crate::interp::content::ContentParser;
use crate::interp::device::TextDevice;
use crate::model::objects::PdfObject;
use crate::model::state::{GraphicsState, TextState};
use crate::utils::{apply_matrix_pt, mult_matrix, translate_matrix, Matrix, Rect};
use std::collections::HashMap;

/// Form XObjects may nest; beyond this something is recursive.
const MAX_FORM_DEPTH: usize = 16;

/// Fraction of an em assumed per glyph: no font metrics are loaded, so
/// every glyph advances half the font size.
const GLYPH_EM: f64 = 0.5;

/// Page CTM folding /Rotate and the box origin into one transform, so
/// downstream geometry is upright with the origin at the lower left.
pub fn page_ctm(mediabox: Rect, rotate: i32) -> Matrix {
    let (x0, y0, x1, y1) = mediabox;
    match rotate {
        90 => (0.0, -1.0, 1.0, 0.0, -y0, x1),
        180 => (-1.0, 0.0, 0.0, -1.0, x1, y1),
        270 => (0.0, 1.0, -1.0, 0.0, y1, -x0),
        _ => (1.0, 0.0, 0.0, 1.0, -x0, -y0),
    }
}

/// Interprets one page's content streams, emitting glyphs to a device.
pub struct PageInterpreter<'a, D: TextDevice> {
    doc: &'a Document,
    device: &'a mut D,
    resources: HashMap<String, PdfObject>,
    gstate: GraphicsState,
    gstack: Vec<GraphicsState>,
    textstate: TextState,
    form_depth: usize,
}

impl<'a, D: TextDevice> PageInterpreter<'a, D> {
    pub fn new(doc: &'a Document, device: &'a mut D) -> Self {
        Self {
            doc,
            device,
            resources: HashMap::new(),
            gstate: GraphicsState::default(),
            gstack: Vec::new(),
            textstate: TextState::new(),
            form_depth: 0,
        }
    }

    /// Run a full page. Content stream damage surfaces as
    /// [`PdfError::CorruptContentStream`] so callers can contain it to
    /// this page.
    pub fn process_page(&mut self, page: &Page) -> Result<()> {
        let ctm = page_ctm(page.mediabox, page.rotate);
        self.device.begin_page(page, ctm);
        self.resources = page.resources.clone();
        self.gstate = GraphicsState::new(ctm);
        self.gstack.clear();
        self.textstate = TextState::new();

        // Multiple /Contents streams form one logical stream; a token
        // may not span the boundary but state does.
        let mut buffer = Vec::new();
        for content in &page.contents {
            let stream = content
                .as_stream()
                .map_err(|e| PdfError::CorruptContentStream(e.to_string()))?;
            let data = self
                .doc
                .get_stream_data(stream)
                .map_err(|e| PdfError::CorruptContentStream(e.to_string()))?;
            if !buffer.is_empty() {
                buffer.push(b' ');
            }
            buffer.extend_from_slice(&data);
        }
        // End the page even on failure: glyphs emitted before the damage
        // are still worth keeping.
        let outcome = self
            .execute(&buffer)
            .map_err(|e| PdfError::CorruptContentStream(e.to_string()));
        self.device.end_page(page);
        outcome
    }

    fn execute(&mut self, data: &[u8]) -> Result<()> {
        let mut parser = ContentParser::new(data);
        while let Some((operands, op)) = parser.next_op()? {
            if let Err(e) = self.dispatch(&operands, &op) {
                // A bad operand for a known operator is recoverable;
                // keep going like viewers do.
                log::warn!("operator {} failed: {}", op, e);
            }
        }
        Ok(())
    }

    fn dispatch(&mut self, operands: &[PdfObject], op: &str) -> Result<()> {
        match op {
            "q" => self.gstack.push(self.gstate.clone()),
            "Q" => {
                if let Some(prev) = self.gstack.pop() {
                    self.gstate = prev;
                }
            }
            "cm" => {
                let m = matrix_operands(operands)?;
                self.gstate.ctm = mult_matrix(m, self.gstate.ctm);
            }
            "BT" => self.textstate.reset(),
            "ET" => {}
            "Tc" => self.textstate.charspace = num(operands, 0)?,
            "Tw" => self.textstate.wordspace = num(operands, 0)?,
            "Tz" => self.textstate.scaling = num(operands, 0)?,
            "TL" => self.textstate.leading = -num(operands, 0)?,
            "Tf" => {
                self.textstate.fontname = operands
                    .first()
                    .and_then(|o| o.as_name().ok())
                    .map(str::to_string);
                self.textstate.fontsize = num(operands, 1)?;
            }
            "Tr" => self.textstate.render = num(operands, 0)? as i32,
            "Ts" => self.textstate.rise = num(operands, 0)?,
            "Td" => {
                let (tx, ty) = (num(operands, 0)?, num(operands, 1)?);
                self.textstate.matrix = translate_matrix(self.textstate.matrix, (tx, ty));
                self.textstate.linematrix = (0.0, 0.0);
            }
            "TD" => {
                let (tx, ty) = (num(operands, 0)?, num(operands, 1)?);
                self.textstate.leading = ty;
                self.textstate.matrix = translate_matrix(self.textstate.matrix, (tx, ty));
                self.textstate.linematrix = (0.0, 0.0);
            }
            "Tm" => {
                self.textstate.matrix = matrix_operands(operands)?;
                self.textstate.linematrix = (0.0, 0.0);
            }
            "T*" => self.next_line(),
            "Tj" => self.show_string(operands.first())?,
            "'" => {
                self.next_line();
                self.show_string(operands.first())?;
            }
            "\"" => {
                self.textstate.wordspace = num(operands, 0)?;
                self.textstate.charspace = num(operands, 1)?;
                self.next_line();
                self.show_string(operands.get(2))?;
            }
            "TJ" => {
                let arr = operands
                    .first()
                    .ok_or_else(|| PdfError::SyntaxError("TJ without operand".into()))?
                    .as_array()?;
                for item in arr {
                    match item {
                        PdfObject::String(s) => self.render_string(s),
                        PdfObject::Int(_) | PdfObject::Real(_) => {
                            let d = item.as_num()?;
                            let ts = &mut self.textstate;
                            ts.linematrix.0 -= d * 0.001 * ts.fontsize * ts.scaling * 0.01;
                        }
                        _ => {}
                    }
                }
            }
            "Do" => self.do_xobject(operands.first())?,
            // Path, color and marked-content operators carry no text.
            _ => log::trace!("ignoring operator {}", op),
        }
        Ok(())
    }

    fn next_line(&mut self) {
        let leading = self.textstate.leading;
        self.textstate.matrix = translate_matrix(self.textstate.matrix, (0.0, leading));
        self.textstate.linematrix = (0.0, 0.0);
    }

    fn show_string(&mut self, operand: Option<&PdfObject>) -> Result<()> {
        let s = operand
            .ok_or_else(|| PdfError::SyntaxError("show operator without operand".into()))?
            .as_string()?;
        self.render_string(s);
        Ok(())
    }

    /// Emit one glyph per byte, walking the line matrix forward. Without
    /// font programs each glyph gets a fixed half-em advance; spacing
    /// parameters still apply.
    fn render_string(&mut self, text: &[u8]) {
        let fontsize = self.textstate.fontsize;
        let scaling = self.textstate.scaling * 0.01;
        let rise = self.textstate.rise;
        let charspace = self.textstate.charspace;
        let wordspace = self.textstate.wordspace;
        let adv = GLYPH_EM * fontsize * scaling;

        for &byte in text {
            let matrix = mult_matrix(
                translate_matrix(self.textstate.matrix, self.textstate.linematrix),
                self.gstate.ctm,
            );
            let (ax, ay) = apply_matrix_pt(matrix, (0.0, rise));
            let (bx, by) = apply_matrix_pt(matrix, (adv, rise + fontsize));
            let bbox = (ax.min(bx), ay.min(by), ax.max(bx), ay.max(by));
            self.device.render_char(bbox, byte);

            let mut step = adv + charspace * scaling;
            if byte == b' ' {
                step += wordspace * scaling;
            }
            self.textstate.linematrix.0 += step;
        }
    }

    /// Execute a Form XObject in its own graphics scope. Image XObjects
    /// are ignored.
    fn do_xobject(&mut self, operand: Option<&PdfObject>) -> Result<()> {
        let name = operand
            .ok_or_else(|| PdfError::SyntaxError("Do without operand".into()))?
            .as_name()?;
        let xobjects = match self.resources.get("XObject") {
            Some(x) => self.doc.resolve(x)?,
            None => return Ok(()),
        };
        let xobject = match xobjects.as_dict()?.get(name) {
            Some(x) => self.doc.resolve(x)?,
            None => {
                log::warn!("undefined XObject /{}", name);
                return Ok(());
            }
        };
        let stream = match xobject.as_stream() {
            Ok(s) => s,
            Err(_) => return Ok(()),
        };
        let subtype = stream.get("Subtype").and_then(|s| s.as_name().ok());
        if subtype != Some("Form") {
            return Ok(());
        }
        if self.form_depth >= MAX_FORM_DEPTH {
            return Err(PdfError::SyntaxError("form XObjects nested too deep".into()));
        }

        let saved_gstate = self.gstate.clone();
        let saved_resources = self.resources.clone();
        if let Some(m) = stream.get("Matrix") {
            if let Ok(arr) = self.doc.resolve(m) {
                if let Ok(arr) = arr.as_array() {
                    if let Ok(m) = matrix_operands(arr) {
                        self.gstate.ctm = mult_matrix(m, self.gstate.ctm);
                    }
                }
            }
        }
        if let Some(res) = stream.get("Resources") {
            if let Ok(PdfObject::Dict(dict)) = self.doc.resolve(res) {
                self.resources = dict;
            }
        }

        let data = self.doc.get_stream_data(stream)?;
        self.form_depth += 1;
        let result = self.execute(&data);
        self.form_depth -= 1;
        self.gstate = saved_gstate;
        self.resources = saved_resources;
        result
    }
}

fn num(operands: &[PdfObject], index: usize) -> Result<f64> {
    operands
        .get(index)
        .ok_or_else(|| PdfError::SyntaxError(format!("missing operand {}", index)))?
        .as_num()
}

fn matrix_operands(operands: &[PdfObject]) -> Result<Matrix> {
    if operands.len() < 6 {
        return Err(PdfError::SyntaxError("matrix needs six operands".into()));
    }
    Ok((
        operands[0].as_num()?,
        operands[1].as_num()?,
        operands[2].as_num()?,
        operands[3].as_num()?,
        operands[4].as_num()?,
        operands[5].as_num()?,
    ))
}
