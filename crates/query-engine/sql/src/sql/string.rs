//! Type definitions of a low-level SQL string representation.

/// How the rendered statement should look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderMode {
    /// Inline parameter values as SQL literals instead of emitting placeholders.
    pub literal_binds: bool,
    /// Leave out `AS "x"` when a selected column is already called `x`.
    pub simple_names: bool,
}

/// The placeholder syntax a database driver expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamStyle {
    /// `$1`, `$2`, ...
    #[default]
    Dollar,
    /// `?`
    QuestionMark,
}

/// Type definitions of a low-level SQL string representation.
#[derive(Debug, PartialEq, Eq)]
pub struct SQL {
    pub sql: String,
    pub params: Vec<Param>,
    /// for internal use and tests only
    pub param_index: u64,
    mode: RenderMode,
    param_style: ParamStyle,
}

impl Default for SQL {
    fn default() -> Self {
        Self::new()
    }
}

/// A parameter for a parameterized query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    /// A literal string
    String(String),
}

impl SQL {
    pub fn new() -> SQL {
        SQL::with_options(RenderMode::default(), ParamStyle::default())
    }
    pub fn with_options(mode: RenderMode, param_style: ParamStyle) -> SQL {
        SQL {
            sql: String::new(),
            params: vec![],
            param_index: 0,
            mode,
            param_style,
        }
    }
    pub fn mode(&self) -> RenderMode {
        self.mode
    }
    pub fn append_syntax(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }
    pub fn append_identifier(&mut self, sql: &str) {
        self.sql.push('"');
        self.sql.push_str(&sql.replace('"', "\"\""));
        self.sql.push('"');
    }
    pub fn append_string_literal(&mut self, value: &str) {
        self.sql.push('\'');
        self.sql.push_str(&value.replace('\'', "''"));
        self.sql.push('\'');
    }
    /// Append a string value either as a placeholder or, when rendering with
    /// literal binds, inline.
    pub fn append_param(&mut self, param: Param) {
        if self.mode.literal_binds {
            let Param::String(value) = &param;
            self.append_string_literal(value);
            return;
        }
        self.param_index += 1;
        match self.param_style {
            ParamStyle::Dollar => self.sql.push_str(&format!("${}", self.param_index)),
            ParamStyle::QuestionMark => self.sql.push('?'),
        }
        self.params.push(param);
    }
}
