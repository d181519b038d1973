use crate::import_record::ImportRecord;
use diagnostics::Loc;
use diagnostics::Span;

/// A parsed CSS file, reduced to what the bundler needs: the rule list with
/// `@import` rules resolved through the shared import-record list.
///
/// CSS entries live only in the in-memory cache, so this tree has no wire
/// form.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct CssAst {
  pub rules: Vec<CssRule>,
  pub import_records: Vec<ImportRecord>,
  pub source_map_comment: Option<Span>,
  pub approximate_line_count: i32,
}

#[derive(Clone, PartialEq, Debug)]
pub enum CssRule {
  AtCharset {
    encoding: String,
    loc: Loc,
  },

  AtImport {
    import_record_index: u32,
    loc: Loc,
  },

  AtLayer {
    names: Vec<String>,
    loc: Loc,
  },

  Qualified {
    prelude: String,
    decls: Vec<CssDecl>,
    loc: Loc,
  },

  Comment {
    text: String,
    loc: Loc,
  },
}

#[derive(Clone, PartialEq, Debug)]
pub struct CssDecl {
  pub key: String,
  pub value: String,
  pub important: bool,
  pub loc: Loc,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::import_record::ImportKind;
  use diagnostics::Path;
  use diagnostics::Range;

  #[test]
  fn import_rules_reference_records_by_index() {
    let mut ast = CssAst::default();
    ast
      .import_records
      .push(ImportRecord::new(ImportKind::At, Path::file("./base.css"), Range::new(Loc(8), 12)));
    ast.rules.push(CssRule::AtImport {
      import_record_index: 0,
      loc: Loc(0),
    });
    ast.rules.push(CssRule::Qualified {
      prelude: "body".to_string(),
      decls: vec![CssDecl {
        key: "margin".to_string(),
        value: "0".to_string(),
        important: false,
        loc: Loc(30),
      }],
      loc: Loc(24),
    });

    match &ast.rules[0] {
      CssRule::AtImport {
        import_record_index, ..
      } => {
        let record = &ast.import_records[*import_record_index as usize];
        assert_eq!(record.kind, ImportKind::At);
      }
      other => panic!("unexpected rule: {other:?}"),
    }
  }
}
