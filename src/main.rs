use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use rule_expr::config::{Grammar, Options, DEFAULT_MAX_DEPTH, DEFAULT_MAX_TOKENS};
use rule_expr::error::{self, ExprError};
use rule_expr::value::{self, Value, Variables};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Identifier rules: standard or extended (allows '.' and '-')
    #[arg(long, global = true, env = "RULE_EXPR_GRAMMAR", default_value = "standard")]
    grammar: Grammar,

    /// Deepest parenthesis nesting accepted
    #[arg(long, global = true, env = "RULE_EXPR_MAX_DEPTH", default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Largest number of tokens accepted
    #[arg(long, global = true, env = "RULE_EXPR_MAX_TOKENS", default_value_t = DEFAULT_MAX_TOKENS)]
    max_tokens: usize,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate an expression and print true or false
    Eval {
        expression: String,

        /// Variable as NAME=VALUE; VALUE is true/false, an integer, or text
        #[arg(short, long = "var", value_parser = parse_assignment)]
        vars: Vec<(String, Value)>,

        /// JSON object of variables
        #[arg(short = 'f', long)]
        vars_file: Option<PathBuf>,
    },
    /// Print the tokens of an expression
    Tokens { expression: String },
    /// Print the variables an expression references
    Vars { expression: String },
    /// Rewrite bare identifiers into `ident == true`
    Translate { expression: String },
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();
    let options = Options::default()
        .with_grammar(args.grammar)
        .with_max_depth(args.max_depth)
        .with_max_tokens(args.max_tokens);

    match args.command {
        Commands::Eval { expression, vars, vars_file } => {
            let variables = match load_variables(vars, vars_file) {
                Ok(variables) => variables,
                Err(message) => {
                    eprintln!("{}", message);
                    return ExitCode::FAILURE;
                }
            };
            report(&expression, run(&expression, &variables, &options))
        }
        Commands::Tokens { expression } => {
            let result = rule_expr::tokenize_with(&expression, options.grammar).map(|tokens| {
                for token in tokens {
                    println!("{} {}:{}", token, token.line, token.column);
                }
            });
            report(&expression, result)
        }
        Commands::Vars { expression } => {
            let result =
                rule_expr::extract_variables_with(&expression, options.grammar).map(|names| {
                    for name in names {
                        println!("{}", name);
                    }
                });
            report(&expression, result)
        }
        Commands::Translate { expression } => {
            let result =
                rule_expr::translate_with(&expression, options.grammar).map(|(text, names)| {
                    println!("{}", text);
                    for name in names {
                        println!("{}", name);
                    }
                });
            report(&expression, result)
        }
    }
}

pub fn run(source: &str, variables: &Variables, options: &Options) -> Result<(), ExprError> {
    let result = rule_expr::evaluate_with(source, variables, options)?;
    println!("{}", result);
    Ok(())
}

/// Prints an error report for a failed command and picks the exit code.
fn report(source: &str, result: Result<(), ExprError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::debug!("{:?}", err);
            if error::print_error(source, &err).is_err() {
                eprintln!("{}", err);
            }
            ExitCode::FAILURE
        }
    }
}

/// Merges variables from `--vars-file` with `--var` assignments; assignments win.
fn load_variables(
    vars: Vec<(String, Value)>,
    vars_file: Option<PathBuf>,
) -> Result<Variables, String> {
    let mut variables = match vars_file {
        Some(path) => {
            let context = |e: &dyn std::fmt::Display| format!("{}: {}", path.display(), e);
            let text = std::fs::read_to_string(&path).map_err(|e| context(&e))?;
            let json: serde_json::Value = serde_json::from_str(&text).map_err(|e| context(&e))?;
            value::variables_from_json(&json).map_err(|e| context(&e))?
        }
        None => Variables::new(),
    };
    variables.extend(vars);
    Ok(variables)
}

/// Parses `NAME=VALUE`. `true`/`false` are booleans, decimal integers are integers,
/// anything else is text with surrounding single quotes removed.
fn parse_assignment(arg: &str) -> Result<(String, Value), String> {
    let (name, raw) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", arg))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing variable name in '{}'", arg));
    }

    let value = match raw {
        "true" => Value::Boolean(true),
        "false" => Value::Boolean(false),
        _ => match raw.parse::<i64>() {
            Ok(n) => Value::Integer(n),
            Err(_) => {
                let text = raw.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')).unwrap_or(raw);
                Value::Text(text.to_string())
            }
        },
    };
    Ok((name.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        let cases = vec![
            ("flag=true", ("flag", Value::Boolean(true))),
            ("flag=false", ("flag", Value::Boolean(false))),
            ("count=15", ("count", Value::Integer(15))),
            ("count=-3", ("count", Value::Integer(-3))),
            ("name='Test String'", ("name", Value::from("Test String"))),
            ("name=plain", ("name", Value::from("plain"))),
            ("name=", ("name", Value::from(""))),
            ("expr=a==b", ("expr", Value::from("a==b"))),
        ];
        for (arg, (name, value)) in cases {
            let parsed = parse_assignment(arg).unwrap();
            assert_eq!(parsed, (name.to_string(), value), "Input: {:?}", arg);
        }
    }

    #[test]
    fn test_parse_assignment_invalid() {
        for arg in ["flag", "=true", " =1"] {
            assert!(parse_assignment(arg).is_err(), "Expected failure. Input: {:?}", arg);
        }
    }

    #[test]
    fn test_load_variables_assignments_win() {
        let path = std::env::temp_dir().join(format!("rule_expr_vars_{}.json", std::process::id()));
        std::fs::write(&path, r#"{"a": true, "n": 15}"#).unwrap();

        let assignments = vec![("a".to_string(), Value::Boolean(false))];
        let vars = load_variables(assignments, Some(path.clone())).unwrap();
        assert_eq!(vars["a"], Value::Boolean(false));
        assert_eq!(vars["n"], Value::Integer(15));

        std::fs::write(&path, r#"{"a": 1.5}"#).unwrap();
        assert!(load_variables(Vec::new(), Some(path.clone())).is_err());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_run() {
        let vars = Variables::from([("label_01".to_string(), Value::Boolean(true))]);
        assert!(run("label_01 == true", &vars, &Options::default()).is_ok());
        assert!(run("label_02", &vars, &Options::default()).is_err());
    }

    #[test]
    fn test_args() {
        let args = Args::try_parse_from([
            "rule_expr", "--grammar", "extended", "eval", "a.b", "--var", "a.b=true",
        ])
        .unwrap();
        assert_eq!(args.grammar, Grammar::Extended);
        match args.command {
            Commands::Eval { expression, vars, vars_file } => {
                assert_eq!(expression, "a.b");
                assert_eq!(vars, vec![("a.b".to_string(), Value::Boolean(true))]);
                assert!(vars_file.is_none());
            }
            other => panic!("Expected Eval, got {:?}", other),
        }
    }
}
