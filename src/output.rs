//! JSON result consumed by editor integrations.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, Result};
use crate::printer::{print_fragment, Mode};
use crate::synth::Synthesized;

/// One replacement: the byte range `[start, end)` of the file and the code to put there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub start: usize,
    pub end: usize,
    pub code: String,
}

impl Output {
    pub fn from_synthesized(s: &Synthesized, mode: Mode) -> Self {
        Output {
            start: s.start,
            end: s.end,
            code: print_fragment(&s.fragment, mode),
        }
    }
}

/// Writes `outputs` as a JSON list followed by a newline.
pub fn write_json<W: Write>(mut w: W, outputs: &[Output]) -> Result<()> {
    serde_json::to_writer(&mut w, outputs).map_err(|e| ErrorKind::Render(e.to_string()))?;
    w.write_all(b"\n")
        .map_err(|e| ErrorKind::Render(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::{Expr, Fragment, Node};

    #[test]
    fn json_is_a_single_element_list() {
        let s = Synthesized {
            start: 4,
            end: 7,
            fragment: Fragment {
                node: Node::Expr(Expr::atom("nil")),
                lines: 0,
            },
        };
        let mut buf = Vec::new();
        write_json(&mut buf, &[Output::from_synthesized(&s, Mode::Gofmt)]).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "[{\"start\":4,\"end\":7,\"code\":\"nil\"}]\n"
        );
    }
}
