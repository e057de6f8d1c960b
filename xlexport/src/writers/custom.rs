use std::{
    io::Write,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use context_error::*;
use regex::Regex;
use xlcore::{XlError, path::read_to_string, xtable::XTable};

use crate::{
    WriterOptions,
    writers::{CrossLinkWriter, precondition, with_suffix, write_file},
};

/// A table laid out by a user template
#[derive(Clone, Copy, Debug)]
pub(crate) struct CustomTable;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\[\]]+)\]").unwrap());

/// A parsed template, the data part is repeated for every row
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Template {
    pub header: Vec<String>,
    pub data: Vec<String>,
    pub footer: Vec<String>,
}

impl Template {
    /// Parse a template with `[header]`, `[data]`, and `[footer]` sections. Lines before the
    /// first section are ignored.
    /// # Errors
    /// If there is no data section.
    pub(crate) fn parse(text: &str, source: &Path) -> Result<Self, XlError> {
        let mut template = Self::default();
        let mut section = None;
        let mut has_data = false;
        for line in text.lines() {
            match line.trim().to_ascii_lowercase().as_str() {
                "[header]" => section = Some(0),
                "[data]" => {
                    section = Some(1);
                    has_data = true;
                }
                "[footer]" => section = Some(2),
                _ => match section {
                    Some(0) => template.header.push(line.to_string()),
                    Some(1) => template.data.push(line.to_string()),
                    Some(2) => template.footer.push(line.to_string()),
                    _ => (),
                },
            }
        }
        if has_data {
            Ok(template)
        } else {
            Err(BoxedError::new(
                BasicKind::Error,
                "Invalid custom template",
                "The template does not have a '[data]' section",
                Context::default().source(source.to_string_lossy()).to_owned(),
            ))
        }
    }

    /// All columns used in the data section
    pub(crate) fn columns(&self) -> impl Iterator<Item = &str> {
        self.data.iter().flat_map(|line| {
            PLACEHOLDER
                .captures_iter(line)
                .filter_map(|c| c.get(1).map(|m| m.as_str()))
        })
    }
}

impl CrossLinkWriter for CustomTable {
    const TAG: &'static str = "customTable";

    fn write(
        table: &XTable,
        out: &Path,
        options: &WriterOptions,
    ) -> Result<Vec<PathBuf>, XlError> {
        let template_path = options.custom_template_path.as_deref().ok_or_else(|| {
            precondition(
                Self::TAG,
                "A custom table needs the 'customTemplatePath' option",
            )
        })?;
        let template = Template::parse(&read_to_string(template_path)?, template_path)?;
        if let Some(unknown) = template.columns().find(|c| !table.has_column(c)) {
            return Err(precondition(
                Self::TAG,
                format!("The template uses the column '{unknown}' which is not in the table"),
            ));
        }
        let extension = template_path
            .extension()
            .map_or_else(|| "txt".to_string(), |e| e.to_string_lossy().to_string());
        let path = with_suffix(out, &format!(".{extension}"));
        write_file(&path, |w| {
            for line in &template.header {
                writeln!(w, "{line}")?;
            }
            for row in &table.rows {
                for line in &template.data {
                    let line = PLACEHOLDER.replace_all(line, |c: &regex::Captures| {
                        row.cell(&c[1]).unwrap_or_default()
                    });
                    writeln!(w, "{line}")?;
                }
            }
            for line in &template.footer {
                writeln!(w, "{line}")?;
            }
            Ok(())
        })?;
        Ok(vec![path])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writers::test::table;

    const TEMPLATE: &str = "[header]
# links
link\tscore
[data]
[ID]\t[score]
[footer]
# end
";

    #[test]
    fn template() {
        let template = Template::parse(TEMPLATE, Path::new("links.tsv")).unwrap();
        assert_eq!(template.header, vec!["# links", "link\tscore"]);
        assert_eq!(template.data, vec!["[ID]\t[score]"]);
        assert_eq!(template.footer, vec!["# end"]);
        assert_eq!(template.columns().collect::<Vec<_>>(), vec!["ID", "score"]);
        assert!(Template::parse("[header]\na", Path::new("links.tsv")).is_err());
    }

    #[test]
    fn custom_table() {
        let directory = tempfile::tempdir().unwrap();
        let template = directory.path().join("links.tsv");
        std::fs::write(&template, TEMPLATE).unwrap();
        let options = WriterOptions {
            custom_template_path: Some(template.clone()),
            ..WriterOptions::default()
        };
        let written =
            CustomTable::write(&table(), &directory.path().join("sample"), &options).unwrap();
        assert_eq!(written, vec![directory.path().join("sample.tsv")]);
        assert_eq!(
            std::fs::read_to_string(&written[0]).unwrap(),
            "# links\nlink\tscore\nProtA-42\t27.3\nProtA-10-ProtB-20\t5\nProtA-10-ProtB-20\t8\nProtA-10\t2\nProtB-51-ProtB-83\t\n# end\n"
        );

        std::fs::write(&template, "[data]\n[ID] [not_a_column]\n").unwrap();
        let error = CustomTable::write(&table(), &directory.path().join("other"), &options)
            .unwrap_err()
            .to_string();
        assert!(error.contains("not_a_column"));
        assert!(!directory.path().join("other.tsv").exists());
    }
}
