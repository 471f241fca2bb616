//! Console command parsing

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::domain::DisplayPointer;
use crate::session::messages::{DrawMsg, Msg, SessionMsg};

pub const HELP: &str = "\
load <path>                      load a video or image as reference frame
tool line|polygon                select the drawing tool
class <name>                     toggle a class for the next zone
classes                          list classes and the current selection
click <x> <y> <width> <height>   click on the displayed frame
name [text]                      name the pending zone (blank: suggested name)
cancel                           discard the pending zone
undo                             remove the last zone
clear                            remove every zone
render <out.png>                 save the overlay
start | stop                     start or stop the analysis
status                           show the live dashboard
export xlsx|csv|pdf [path]       write a report
help | quit";

fn number(arg: Option<&str>, what: &str) -> Result<f32> {
    let arg = arg.with_context(|| format!("Missing {what}"))?;
    arg.parse::<f32>()
        .with_context(|| format!("Invalid {what}: '{arg}'"))
}

fn rest(line: &str, command: &str) -> Option<String> {
    let text = line.trim_start()[command.len()..].trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Parse one input line; blank lines yield `None`
pub fn parse(line: &str) -> Result<Option<Msg>> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };

    let msg = match command.to_ascii_lowercase().as_str() {
        "load" => {
            let path = rest(line, command).context("Usage: load <path>")?;
            Msg::Session(SessionMsg::Load(PathBuf::from(path)))
        }
        "tool" => {
            let tool = words.next().context("Usage: tool line|polygon")?;
            Msg::Draw(DrawMsg::SelectTool(tool.parse()?))
        }
        "class" => {
            let class = words.next().context("Usage: class <name>")?;
            Msg::Draw(DrawMsg::ToggleClass(class.parse()?))
        }
        "classes" => Msg::Session(SessionMsg::ListClasses),
        "click" => {
            let x = number(words.next(), "x")?;
            let y = number(words.next(), "y")?;
            let width = number(words.next(), "display width")?;
            let height = number(words.next(), "display height")?;
            Msg::Draw(DrawMsg::Click(DisplayPointer::new(x, y, width, height)))
        }
        "name" => Msg::Draw(DrawMsg::Name(rest(line, command))),
        "cancel" => Msg::Draw(DrawMsg::CancelName),
        "undo" => Msg::Draw(DrawMsg::Undo),
        "clear" => Msg::Draw(DrawMsg::Clear),
        "render" => {
            let path = rest(line, command).context("Usage: render <out.png>")?;
            Msg::Session(SessionMsg::Render(PathBuf::from(path)))
        }
        "start" => Msg::Session(SessionMsg::Start),
        "stop" => Msg::Session(SessionMsg::Stop),
        "status" => Msg::Session(SessionMsg::Status),
        "export" => {
            let format = words.next().context("Usage: export xlsx|csv|pdf [path]")?;
            let format = format.parse()?;
            let path = words.next().map(|_| {
                let after_format = line.trim_start()[command.len()..].trim_start();
                let skip = after_format.find(char::is_whitespace).unwrap_or(after_format.len());
                PathBuf::from(after_format[skip..].trim())
            });
            Msg::Session(SessionMsg::Export(format, path))
        }
        "help" | "?" => Msg::Help,
        "quit" | "exit" => Msg::Quit,
        other => anyhow::bail!("Unknown command '{other}' (try 'help')"),
    };
    Ok(Some(msg))
}
