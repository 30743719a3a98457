//
// Data contracts for the line-delimited JSON diagnostic stream.
//

#[derive(Deserialize, Debug)]
pub struct Diagnostic {
    /// The primary message.
    pub message: String,
    #[serde(default)]
    pub code: Option< DiagnosticCode >,
    /// "error", "warning", "note", "help" or "error: internal compiler error".
    pub level: String,
    #[serde(default)]
    pub spans: Vec< DiagnosticSpan >,
    /// Associated sub-diagnostics.
    #[serde(default)]
    pub children: Vec< Diagnostic >
}

#[derive(Deserialize, Debug)]
pub struct DiagnosticSpan {
    pub file_name: String,
    /// 1-based.
    pub line_start: usize,
    pub line_end: usize,
    /// 1-based, character offset.
    pub column_start: usize,
    pub column_end: usize,
    /// The point where the error occurred, as opposed to supporting context.
    pub is_primary: bool,
    /// Source text from the start of line_start to the end of line_end.
    #[serde(default)]
    pub text: Vec< DiagnosticSpanLine >,
    /// Label that should be placed at this location, if any.
    #[serde(default)]
    pub label: Option< String >,
    /// The macro invocation which produced the code at this span, if any.
    #[serde(default)]
    pub expansion: Option< Box< DiagnosticSpanMacroExpansion > >
}

#[derive(Deserialize, Debug)]
pub struct DiagnosticSpanLine {
    pub text: String,
    /// 1-based, character offset in self.text.
    pub highlight_start: usize,
    pub highlight_end: usize
}

#[derive(Deserialize, Debug)]
pub struct DiagnosticSpanMacroExpansion {
    /// The span where the macro was applied to generate this code; this may
    /// itself derive from another macro.
    pub span: DiagnosticSpan,
    /// Name of the applied macro, e.g. "foo!" or "#[derive(Eq)]".
    pub macro_decl_name: String
}

#[derive(Deserialize, Debug)]
pub struct DiagnosticCode {
    /// The code itself.
    pub code: String,
    /// An explanation for the code.
    #[serde(default)]
    pub explanation: Option< String >
}
