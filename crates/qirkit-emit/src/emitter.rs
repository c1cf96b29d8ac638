use crate::config::EmitterConfig;
use anyhow::Result;
use std::io::Write;

pub type EmitResult = Result<()>;

#[derive(Debug, Clone)]
pub struct EmitContext {
    pub indent_level: usize,
    pub indent_chars: String,
    pub use_colors: bool,
}

impl EmitContext {
    pub fn new() -> Self {
        Self {
            indent_level: 0,
            indent_chars: "  ".to_string(),
            use_colors: false,
        }
    }

    pub fn from_config(config: &EmitterConfig) -> Self {
        Self {
            indent_level: 0,
            indent_chars: config.indent_style.to_indent(),
            use_colors: config.use_colors,
        }
    }

    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn dedent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    pub fn get_indent(&self) -> String {
        self.indent_chars.repeat(self.indent_level)
    }

    pub fn nested(&self) -> Self {
        let mut ctx = self.clone();
        ctx.indent();
        ctx
    }
}

impl Default for EmitContext {
    fn default() -> Self {
        Self::new()
    }
}

pub trait Emitter {
    type Item;

    fn emit<W: Write>(
        &self,
        item: &Self::Item,
        writer: &mut W,
        context: &mut EmitContext,
    ) -> EmitResult;

    /// Context a fresh emission starts from.
    fn context(&self) -> EmitContext {
        EmitContext::new()
    }

    fn emit_to_string(&self, item: &Self::Item) -> Result<String> {
        let mut buffer = Vec::new();
        let mut context = self.context();
        self.emit(item, &mut buffer, &mut context)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Highlight applied to a line when the context has colors enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tint {
    Plain,
    Comment,
    Label,
    Declaration,
}

impl Tint {
    pub fn paint(self, text: &str, use_colors: bool) -> String {
        use colored::Colorize;
        if !use_colors {
            return text.to_string();
        }
        match self {
            Tint::Plain => text.to_string(),
            Tint::Comment => text.bright_black().to_string(),
            Tint::Label => text.cyan().bold().to_string(),
            Tint::Declaration => text.yellow().to_string(),
        }
    }
}

pub struct EmitHelper;

impl EmitHelper {
    pub fn write_line<W: Write>(writer: &mut W, context: &EmitContext, text: &str) -> EmitResult {
        Self::write_tinted(writer, context, text, Tint::Plain)
    }

    pub fn write_tinted<W: Write>(
        writer: &mut W,
        context: &EmitContext,
        text: &str,
        tint: Tint,
    ) -> EmitResult {
        writeln!(
            writer,
            "{}{}",
            context.get_indent(),
            tint.paint(text, context.use_colors)
        )?;
        Ok(())
    }

    pub fn write_comment<W: Write>(
        writer: &mut W,
        context: &EmitContext,
        comment: &str,
    ) -> EmitResult {
        Self::write_tinted(writer, context, &format!("; {}", comment), Tint::Comment)
    }

    /// Block label in column zero, with the comment padded out to column 50.
    pub fn write_label<W: Write>(
        writer: &mut W,
        context: &EmitContext,
        label: &str,
        comment: Option<&str>,
    ) -> EmitResult {
        let head = format!("{}:", label);
        let painted = Tint::Label.paint(&head, context.use_colors);
        match comment {
            Some(comment) => {
                let padding = " ".repeat(50usize.saturating_sub(head.len()));
                let comment = Tint::Comment.paint(&format!("; {}", comment), context.use_colors);
                writeln!(writer, "{}{}{}", painted, padding, comment)?;
            }
            None => writeln!(writer, "{}", painted)?,
        }
        Ok(())
    }

    /// `header {`, the body one level deeper, then `}`.
    pub fn write_braced<W: Write, F>(
        writer: &mut W,
        context: &mut EmitContext,
        header: &str,
        body: F,
    ) -> EmitResult
    where
        F: FnOnce(&mut W, &mut EmitContext) -> EmitResult,
    {
        Self::write_tinted(writer, context, &format!("{} {{", header), Tint::Declaration)?;
        context.indent();
        let result = body(writer, context);
        context.dedent();
        result?;
        Self::write_line(writer, context, "}")
    }
}
