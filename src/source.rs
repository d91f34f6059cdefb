// SPDX-License-Identifier: LGPL-3.0-or-later OR MPL-2.0
// This file is a part of `quadkit`.
//
// `quadkit` is free software: you can redistribute it and/or modify it under the
// terms of either:
//
// * GNU Lesser General Public License as published by the Free Software Foundation, either
//   version 3 of the License, or (at your option) any later version.
// * Mozilla Public License as published by the Mozilla Foundation, version 2.
//
// `quadkit` is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR
// PURPOSE. See the GNU Lesser General Public License or the Mozilla Public License for more
// details.
//
// You should have received a copy of the GNU Lesser General Public License and the Mozilla
// Public License along with `quadkit`. If not, see <https://www.gnu.org/licenses/>.

//! Splitting dual-section shader files.

use crate::error::{Error, Result};
use crate::gpu_backend::Stage;

use std::fs;
use std::path::Path;

const DIRECTIVE: &str = "#shader";

/// The source code of both stages of a program, as read from one file.
///
/// A shader file is split into sections by lines containing `#shader vertex` or
/// `#shader fragment`. Every other line belongs to the section above it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ShaderSource {
    vertex: String,
    fragment: String,
}

impl ShaderSource {
    /// Create a source from already split stages.
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// Read and split a shader file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!("parsing shader file {}", path.display());
        Self::parse(&text)
    }

    /// Split the text of a shader file.
    ///
    /// Each line keeps its content and gets a `\n` terminator, whatever terminator it had in
    /// the input. Blank lines before the first directive are ignored; any other line there is
    /// an error, as is a directive that names no known stage. A stage without a section is
    /// left empty.
    pub fn parse(text: &str) -> Result<Self> {
        let mut source = Self::default();
        let mut current = None;

        for (index, line) in text.lines().enumerate() {
            if line.contains(DIRECTIVE) {
                current = Some(directive_stage(line).ok_or_else(|| Error::UnknownStage {
                    line: index + 1,
                    directive: line.trim().to_owned(),
                })?);
                continue;
            }

            let section = match current {
                Some(stage) => source.section_mut(stage),
                None if line.trim().is_empty() => continue,
                None => return Err(Error::ContentBeforeDirective { line: index + 1 }),
            };

            section.push_str(line);
            section.push('\n');
        }

        Ok(source)
    }

    /// The source of the vertex stage.
    pub fn vertex(&self) -> &str {
        &self.vertex
    }

    /// The source of the fragment stage.
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// The source of either stage.
    pub fn stage(&self, stage: Stage) -> &str {
        match stage {
            Stage::Vertex => &self.vertex,
            Stage::Fragment => &self.fragment,
        }
    }

    fn section_mut(&mut self, stage: Stage) -> &mut String {
        match stage {
            Stage::Vertex => &mut self.vertex,
            Stage::Fragment => &mut self.fragment,
        }
    }
}

/// Figure out which stage a directive line switches to.
fn directive_stage(line: &str) -> Option<Stage> {
    if line.contains("vertex") {
        Some(Stage::Vertex)
    } else if line.contains("fragment") {
        Some(Stage::Fragment)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_both_sections() {
        let source = ShaderSource::parse("#shader vertex\nA\n#shader fragment\nB\n").unwrap();
        assert_eq!(source, ShaderSource::new("A\n", "B\n"));
    }

    #[test]
    fn keeps_blank_lines_inside_sections() {
        let text = "#shader vertex\nvoid main() {\n\n}\n#shader fragment\n\nB";
        let source = ShaderSource::parse(text).unwrap();
        assert_eq!(source.vertex(), "void main() {\n\n}\n");
        assert_eq!(source.fragment(), "\nB\n");
    }

    #[test]
    fn sections_may_repeat() {
        let text = "#shader vertex\nA\n#shader fragment\nB\n#shader vertex\nC\n";
        let source = ShaderSource::parse(text).unwrap();
        assert_eq!(source.vertex(), "A\nC\n");
        assert_eq!(source.fragment(), "B\n");
    }

    #[test]
    fn crlf_is_normalized() {
        let source = ShaderSource::parse("#shader vertex\r\nA\r\n#shader fragment\r\nB\r\n")
            .unwrap();
        assert_eq!(source, ShaderSource::new("A\n", "B\n"));
    }

    #[test]
    fn directive_may_be_indented_or_decorated() {
        let source = ShaderSource::parse("  #shader   fragment // lighting\nB\n").unwrap();
        assert_eq!(source.fragment(), "B\n");
        assert_eq!(source.vertex(), "");
    }

    #[test]
    fn missing_section_is_empty() {
        let source = ShaderSource::parse("#shader vertex\nA\n").unwrap();
        assert_eq!(source.stage(Stage::Vertex), "A\n");
        assert_eq!(source.stage(Stage::Fragment), "");
    }

    #[test]
    fn leading_blank_lines_are_skipped() {
        let source = ShaderSource::parse("\n   \n#shader vertex\nA\n").unwrap();
        assert_eq!(source.vertex(), "A\n");
    }

    #[test]
    fn code_before_first_directive_is_rejected() {
        let error = ShaderSource::parse("\n#version 330 core\n#shader vertex\n").unwrap_err();
        assert!(matches!(error, Error::ContentBeforeDirective { line: 2 }));
    }

    #[test]
    fn unknown_stage_is_rejected() {
        let error = ShaderSource::parse("#shader vertex\nA\n#shader geometry\n").unwrap_err();
        match error {
            Error::UnknownStage { line, directive } => {
                assert_eq!(line, 3);
                assert_eq!(directive, "#shader geometry");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_text_gives_empty_source() {
        assert_eq!(ShaderSource::parse("").unwrap(), ShaderSource::default());
    }

    #[test]
    fn parsing_is_deterministic() {
        let text = include_str!("shaders/textured_quad.shader");
        assert_eq!(
            ShaderSource::parse(text).unwrap(),
            ShaderSource::parse(text).unwrap()
        );
    }
}
