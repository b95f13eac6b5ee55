use thiserror::Error;

/// Options and expressions given on the command line.
#[derive(Debug, Default, PartialEq)]
pub struct ProgramOptions {
    /// Print usage and exit.
    pub help: bool,

    /// Print the version and exit.
    pub version: bool,

    /// Expressions to apply to the document, in the order given.
    pub expressions: Vec<String>,
}

#[derive(Debug, PartialEq, Error)]
#[error("invalid option -{option}")]
pub struct ArgumentError {
    /// The whole argument the bad option was found in, e.g. `-hx`.
    pub token: String,
    pub option: char,
}

impl ProgramOptions {
    /// Scans `args` (not including the program name) for flags. Anything
    /// that isn't a flag is an expression; everything after `--` is an
    /// expression too, even if it's empty. Empty arguments before `--` are
    /// ignored.
    pub fn parse<I, S>(args: I) -> Result<Self, ArgumentError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut options = ProgramOptions::default();
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "" => {}
                "--" => {
                    options.expressions.extend(args.by_ref());
                }
                "--help" => options.help = true,
                "--version" => options.version = true,
                flags if flags.len() > 1 && flags.starts_with('-') => {
                    for option in flags.chars().skip(1) {
                        match option {
                            'h' => options.help = true,
                            'v' => options.version = true,
                            _ => {
                                return Err(ArgumentError {
                                    token: arg.clone(),
                                    option,
                                })
                            }
                        }
                    }
                }
                _ => options.expressions.push(arg),
            }
        }

        Ok(options)
    }

    /// Like [`ProgramOptions::parse`], but reads the process arguments.
    /// Arguments that aren't valid UTF-8 are converted lossily.
    pub fn from_env() -> Result<Self, ArgumentError> {
        Self::parse(
            std::env::args_os()
                .skip(1)
                .map(|arg| arg.to_string_lossy().into_owned()),
        )
    }
}
