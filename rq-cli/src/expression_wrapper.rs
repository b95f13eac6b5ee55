/// Name of the binding that holds the document being filtered.
pub const DOCUMENT_BINDING: &str = "item";

/// Binds the document read from stdin.
pub const READ_STATEMENT: &str = "item = parse_json(stdin())";

/// Writes the document to stdout with a two-space indent.
pub const PRINT_STATEMENT: &str = "puts(pretty_json(item))";

/// Turns a user expression into a statement that replaces the document
/// with the expression's value. If the expression assigns to the document
/// (e.g. `item.a = 1`), the modified document is kept instead.
pub fn wrap<T: AsRef<str>>(expression: T) -> String {
    format!("apply {DOCUMENT_BINDING} {{ {} }}", expression.as_ref())
}
