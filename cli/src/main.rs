use codespan::{ByteIndex, ByteSpan, CodeMap, FileName};
use codespan_reporting::{
    emit,
    termcolor::{Color, ColorChoice, ColorSpec, StandardStream, StandardStreamLock, WriteColor},
    Diagnostic, Label, LabelStyle,
};
use rand::{thread_rng, RngCore};
use rustyline::{error::ReadlineError, Editor};

use std::io::{self, Write};

use wallet_calc::{evaluate, wallet::KeySource, Error, Item, ItemType, Name, Value, Workspace};

fn print_greeting(writer: &StandardStream) -> io::Result<()> {
    let mut writer = writer.lock();
    writer.set_color(ColorSpec::new().set_bold(true))?;
    writeln!(writer, "wallet-calc REPL v{}", env!("CARGO_PKG_VERSION"))?;
    writer.reset()?;
    writeln!(writer, "{}", env!("CARGO_PKG_DESCRIPTION"))?;
    writeln!(writer, "Type `.help` for help.")
}

fn print_help(writer: &StandardStream) -> io::Result<()> {
    let mut writer = writer.lock();
    writeln!(writer, "Statements: `$name = expression`, separated by `;`.")?;
    writeln!(
        writer,
        "Operators: `+`, `*`, `<>` (script concatenation); `(...)` groups, \
         `{{a, b}}` builds a list."
    )?;
    writeln!(
        writer,
        "Functions: identity, SHA256, SHA512, address, public_key, update, \
         spend, next_address, evaluate_script."
    )?;
    writeln!(
        writer,
        "Constructors: outpoint, input, output, transaction, wallet."
    )?;
    writeln!(
        writer,
        "A fresh key source is bound to `$keys`; try `wallet($keys)`."
    )?;
    writeln!(writer, "Commands: .dump, .clear, .help.")
}

fn error_span(error: &Error, line_len: usize) -> ByteSpan {
    // The code map assigns the line bytes 1..=len.
    let (start, end) = match *error {
        Error::Lex(offset) => {
            let start = (offset + 1).min(line_len) as u32;
            (start, start + 1)
        }
        _ => (1, line_len as u32 + 1),
    };
    ByteSpan::new(ByteIndex(start), ByteIndex(end))
}

fn report_error(writer: &StandardStream, code_map: &CodeMap<&str>, line: &str, error: &Error) {
    let code = match error {
        Error::Lex(_) => "LEX",
        Error::Format(_) => "FORMAT",
        _ => "EVAL",
    };
    let label = Label::new(error_span(error, line.len()), LabelStyle::Primary)
        .with_message("Error occurred here");
    let diagnostic = Diagnostic::new_error(error.to_string())
        .with_code(code)
        .with_label(label);
    emit(&mut writer.lock(), code_map, &diagnostic).unwrap();
}

fn item_color(item: &Item) -> ColorSpec {
    let color = match item.ty() {
        ItemType::Number | ItemType::Bytes => Color::Cyan,
        ItemType::Secret => Color::Red,
        ItemType::Pubkey | ItemType::Address => Color::Yellow,
        _ => Color::Green,
    };
    ColorSpec::new().set_fg(Some(color)).clone()
}

fn print_item(writer: &mut StandardStreamLock<'_>, item: &Item) -> io::Result<()> {
    writer.set_color(&item_color(item))?;
    write!(writer, "{}", item)?;
    writer.reset()
}

fn print_value(writer: &StandardStream, value: &Value) -> io::Result<()> {
    let mut writer = writer.lock();
    match value {
        Value::Item(item) => print_item(&mut writer, item)?,
        Value::List(items) => {
            write!(writer, "{{")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(writer, ", ")?;
                }
                print_item(&mut writer, item)?;
            }
            write!(writer, "}}")?;
        }
    }
    writeln!(writer)
}

fn dump_workspace(writer: &StandardStream, workspace: &Workspace) -> io::Result<()> {
    let mut writer = writer.lock();
    for (name, item) in workspace.items() {
        write!(writer, "{} = ", name)?;
        print_item(&mut writer, item)?;
        writeln!(writer)?;
    }
    Ok(())
}

fn eval_line(writer: &StandardStream, line: &str, workspace: &mut Workspace) {
    let mut code_map = CodeMap::new();
    code_map.add_filemap(FileName::Virtual("REPL".into()), line);

    let response = evaluate(workspace, line);
    *workspace = response.workspace;
    if let Some(error) = response.error {
        report_error(writer, &code_map, line, &error);
    } else if let Some(value) = response.value {
        print_value(writer, &value).unwrap();
    }
}

fn seeded_workspace() -> Workspace {
    let mut seed = [0_u8; 32];
    thread_rng().fill_bytes(&mut seed);
    Workspace::new().set(Name::new("keys"), Item::KeySource(KeySource::new(seed)))
}

fn main() {
    let mut rl = Editor::<()>::new();
    let writer = StandardStream::stderr(ColorChoice::Auto);
    print_greeting(&writer).unwrap();

    let mut workspace = seeded_workspace();

    loop {
        let line = rl.readline(">>> ");
        match line {
            Ok(line) => {
                match line.as_str() {
                    ".clear" => workspace = seeded_workspace(),
                    ".dump" => dump_workspace(&writer, &workspace).unwrap(),
                    ".help" => print_help(&writer).unwrap(),
                    _ => eval_line(&writer, &line, &mut workspace),
                }
                rl.add_history_entry(line);
            }

            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("Bye");
                break;
            }

            Err(e) => panic!("Error reading command: {}", e),
        }
    }
}
