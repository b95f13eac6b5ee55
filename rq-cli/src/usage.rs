use std::io::{self, Write};

use crate::evaluator::Evaluator;

const USAGE: &str = "Usage: rq [options] [--] [EXPRESSION...]
  -v              print the version number
  -h              show this message";

pub fn print_usage(stream: &mut dyn Write) -> io::Result<()> {
    writeln!(stream, "{USAGE}")
}

/// Returns e.g. `rq 0.1.0 (rq-lang 0.1.0)`.
pub fn version_string<E: Evaluator>() -> String {
    format!(
        "rq {} ({} {})",
        env!("CARGO_PKG_VERSION"),
        E::NAME,
        E::VERSION
    )
}

pub fn print_version<E: Evaluator>(stream: &mut dyn Write) -> io::Result<()> {
    writeln!(stream, "{}", version_string::<E>())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rq_lang::Interpreter;

    use super::{print_usage, version_string};

    #[test]
    fn version_names_both_programs() {
        assert_eq!(
            version_string::<Interpreter>(),
            format!(
                "rq {} (rq-lang {})",
                env!("CARGO_PKG_VERSION"),
                Interpreter::VERSION
            )
        );
    }

    #[test]
    fn usage_lists_flags() {
        let mut output = vec![];
        print_usage(&mut output).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Usage: rq [options] [--] [EXPRESSION...]\n  -v              print the version number\n  -h              show this message\n"
        );
    }
}
