//! Schema registry for spreadsheet import and persistence.
//!
//! # Responsibility
//! - Describe, per family, the table, key column and data columns.
//! - Register every accepted spreadsheet header layout and how each header
//!   cell maps onto a record column.
//! - Declare required columns, natural-key columns and the grouping column.
//!
//! # Invariants
//! - Layouts are tried in registration order; earlier layouts win.
//! - Every `Slot::Column`/`Slot::StatementPart` target is a data column of
//!   the owning schema; the key column is only ever filled through
//!   `Slot::Identifier`.
//! - Column names are lower-case snake_case because SQLite identifiers are
//!   case-insensitive (`Tipo` and `tipo` would collide).

use crate::model::family::Family;
use once_cell::sync::Lazy;

/// What one header cell feeds in a normalized record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Externally supplied identifier (key column).
    Identifier,
    /// One data column, copied verbatim after trimming.
    Column(&'static str),
    /// One part of a column assembled from several cells.
    StatementPart(&'static str),
}

/// One accepted header layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Short stable name used in logs and import summaries.
    pub name: &'static str,
    /// Exact header sequence, compared after trimming.
    pub headers: Vec<&'static str>,
    /// Record slot fed by each header position.
    pub slots: Vec<Slot>,
}

impl Layout {
    fn new(name: &'static str, cells: &[(&'static str, Slot)]) -> Self {
        Self {
            name,
            headers: cells.iter().map(|(header, _)| *header).collect(),
            slots: cells.iter().map(|(_, slot)| *slot).collect(),
        }
    }

    /// Returns a copy of this layout with a leading identifier column.
    fn with_leading_identifier(&self, name: &'static str, header: &'static str) -> Self {
        let mut headers = Vec::with_capacity(self.headers.len() + 1);
        headers.push(header);
        headers.extend(self.headers.iter().copied());

        let mut slots = Vec::with_capacity(self.slots.len() + 1);
        slots.push(Slot::Identifier);
        slots.extend(self.slots.iter().copied());

        Self {
            name,
            headers,
            slots,
        }
    }

    /// Offset of the supplied-identifier cell, if this layout has one.
    pub fn identifier_offset(&self) -> Option<usize> {
        self.slots.iter().position(|slot| *slot == Slot::Identifier)
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

/// Persistence and import description of one content family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilySchema {
    pub family: Family,
    /// Backing table.
    pub table: &'static str,
    /// Primary key and upsert conflict column.
    pub key_column: &'static str,
    /// Data columns, in storage order, excluding `key_column`.
    pub columns: &'static [&'static str],
    /// Columns that must be non-blank after trimming.
    pub required: &'static [&'static str],
    /// Columns hashed, in this order, into a content-derived identifier.
    pub natural_key: &'static [&'static str],
    /// Column whose value partitions records in grouped retrieval.
    pub group_column: &'static str,
    /// Reject header rows with non-blank cells after the matched layout.
    pub strict_trailing: bool,
    /// Accepted layouts, in match priority order.
    pub layouts: Vec<Layout>,
}

impl FamilySchema {
    /// Returns the storage position of a data column.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|candidate| *candidate == column)
    }

    /// Finds a registered layout by name.
    pub fn layout(&self, name: &str) -> Option<&Layout> {
        self.layouts.iter().find(|layout| layout.name == name)
    }
}

/// Returns the registered schema for one family.
pub fn schema_for(family: Family) -> &'static FamilySchema {
    let schema = match family {
        Family::Codes => &REGISTRY.codes,
        Family::Statutes => &REGISTRY.statutes,
        Family::Laws => &REGISTRY.laws,
        Family::Jurisprudence => &REGISTRY.jurisprudence,
        Family::Constitution => &REGISTRY.constitution,
        Family::Exam => &REGISTRY.exam,
    };
    debug_assert_eq!(schema.family, family);
    schema
}

struct Registry {
    codes: FamilySchema,
    statutes: FamilySchema,
    laws: FamilySchema,
    jurisprudence: FamilySchema,
    constitution: FamilySchema,
    exam: FamilySchema,
}

static REGISTRY: Lazy<Registry> = Lazy::new(|| Registry {
    codes: codes_schema(),
    statutes: statutes_schema(),
    laws: laws_schema(),
    jurisprudence: jurisprudence_schema(),
    constitution: constitution_schema(),
    exam: exam_schema(),
});

use Slot::{Column as C, Identifier as Id, StatementPart as S};

const CODES_COLUMNS: &[&str] = &[
    "idtipo",
    "tipo",
    "nomecodigo",
    "cabecalho",
    "parte",
    "idlivro",
    "livro",
    "livrotexto",
    "idtitulo",
    "titulo",
    "titulotexto",
    "idsubtitulo",
    "subtitulo",
    "subtitulotexto",
    "idcapitulo",
    "capitulo",
    "capitulotexto",
    "idsecao",
    "secao",
    "secaotexto",
    "idsubsecao",
    "subsecao",
    "subsecaotexto",
    "num_artigo",
    "normativo",
    "ordem",
];

const STATUTES_COLUMNS: &[&str] = &[
    "idtipo",
    "tipo",
    "nomecodigo",
    "cabecalho",
    "parte",
    "idlivro",
    "livro",
    "livrotexto",
    "idtitulo",
    "titulo",
    "titulotexto",
    "idsubtitulo",
    "subtitulo",
    "subtitulotexto",
    "idcapitulo",
    "capitulo",
    "capitulotexto",
    "idsecao",
    "secao",
    "secaotexto",
    "idsubsecao",
    "subsecao",
    "subsecaotexto",
    "num_artigo",
    "artigos",
    "ordem",
];

const LAWS_COLUMNS: &[&str] = &[
    "idtipo",
    "tipo",
    "nomecodigo",
    "cabecalho",
    "idparte",
    "parte",
    "partetexto",
    "idtitulo",
    "titulo",
    "titulotexto",
    "idcapitulo",
    "capitulo",
    "capitulotexto",
    "idsecao",
    "secao",
    "secaotexto",
    "idsubsecao",
    "subsecao",
    "subsecaotexto",
    "num_artigo",
    "artigos",
    "ordem",
];

const JURISPRUDENCE_COLUMNS: &[&str] = &[
    "idtipo",
    "tipo",
    "idcodigo",
    "nomecodigo",
    "cabecalho",
    "tipo_descricao",
    "idramo",
    "ramotexto",
    "idassunto",
    "assuntotexto",
    "idenunciado",
    "enunciado",
    "idsecao",
    "secao",
    "secaotexto",
    "idsubsecao",
    "subsecao",
    "subsecaotexto",
    "num_artigo",
    "normativo",
    "ordem",
];

const CONSTITUTION_COLUMNS: &[&str] = &[
    "idtipo",
    "tipo",
    "cabecalho",
    "idtitulo",
    "titulo",
    "textodotitulo",
    "idcapitulo",
    "capitulo",
    "textocapitulo",
    "idsecao",
    "secao",
    "textosecao",
    "idsubsecao",
    "subsecao",
    "textosubsecao",
    "normativo",
];

const EXAM_COLUMNS: &[&str] = &[
    "idtipo",
    "tipo",
    "nomecodigo",
    "cabecalho",
    "titulo",
    "titulotexto",
    "titulo_label",
    "capitulo",
    "capitulotexto",
    "capitulo_label",
    "secao",
    "secaotexto",
    "secao_label",
    "subsecao",
    "subsecaotexto",
    "subsecao_label",
    "num_artigo",
    "artigos",
];

/// Book/title/subtitle/chapter/section/subsection chain shared by the
/// codes and statutes layouts, starting at `idlivro`.
const CODE_HIERARCHY: &[(&str, Slot)] = &[
    ("idlivro", C("idlivro")),
    ("livro", C("livro")),
    ("livrotexto", C("livrotexto")),
    ("idtitulo", C("idtitulo")),
    ("titulo", C("titulo")),
    ("titulotexto", C("titulotexto")),
    ("idsubtitulo", C("idsubtitulo")),
    ("subtitulo", C("subtitulo")),
    ("subtitulotexto", C("subtitulotexto")),
    ("idcapitulo", C("idcapitulo")),
    ("capitulo", C("capitulo")),
    ("capitulotexto", C("capitulotexto")),
    ("idsecao", C("idsecao")),
    ("secao", C("secao")),
    ("secaotexto", C("secaotexto")),
    ("idsubsecao", C("idsubsecao")),
    ("subsecao", C("subsecao")),
    ("subsecaotexto", C("subsecaotexto")),
];

fn code_style_layout(statement_header: &'static str, statement_column: &'static str) -> Layout {
    let mut cells = vec![
        ("idtipo", C("idtipo")),
        ("tipo", C("tipo")),
        ("idcodigo", Id),
        ("nomecodigo", C("nomecodigo")),
        ("Cabecalho", C("cabecalho")),
        ("PARTE", C("parte")),
    ];
    cells.extend_from_slice(CODE_HIERARCHY);
    cells.extend_from_slice(&[
        ("num_artigo", C("num_artigo")),
        (statement_header, C(statement_column)),
        ("Ordem", C("ordem")),
    ]);
    Layout::new("legacy", &cells)
}

fn codes_schema() -> FamilySchema {
    // v2 drops PARTE and the subtitle level and moves idcodigo to the front.
    let v2 = Layout::new(
        "v2",
        &[
            ("idcodigo", Id),
            ("idtipo", C("idtipo")),
            ("tipo", C("tipo")),
            ("nomecodigo", C("nomecodigo")),
            ("Cabecalho", C("cabecalho")),
            ("idlivro", C("idlivro")),
            ("livro", C("livro")),
            ("livrotexto", C("livrotexto")),
            ("idtitulo", C("idtitulo")),
            ("titulo", C("titulo")),
            ("titulotexto", C("titulotexto")),
            ("idcapitulo", C("idcapitulo")),
            ("capitulo", C("capitulo")),
            ("capitulotexto", C("capitulotexto")),
            ("idsecao", C("idsecao")),
            ("secao", C("secao")),
            ("secaotexto", C("secaotexto")),
            ("idsubsecao", C("idsubsecao")),
            ("subsecao", C("subsecao")),
            ("subsecaotexto", C("subsecaotexto")),
            ("num_artigo", C("num_artigo")),
            ("Normativo", C("normativo")),
            ("Ordem", C("ordem")),
        ],
    );

    FamilySchema {
        family: Family::Codes,
        table: "vade_mecum_codigos",
        key_column: "idcodigo",
        columns: CODES_COLUMNS,
        required: &["nomecodigo"],
        natural_key: &["nomecodigo", "num_artigo", "normativo"],
        group_column: "nomecodigo",
        strict_trailing: true,
        layouts: vec![code_style_layout("Normativo", "normativo"), v2],
    }
}

fn statutes_schema() -> FamilySchema {
    FamilySchema {
        family: Family::Statutes,
        table: "vade_mecum_estatutos",
        key_column: "idcodigo",
        columns: STATUTES_COLUMNS,
        required: &["nomecodigo"],
        natural_key: &["nomecodigo", "num_artigo", "artigos"],
        group_column: "nomecodigo",
        strict_trailing: false,
        layouts: vec![code_style_layout("Artigos", "artigos")],
    }
}

fn laws_schema() -> FamilySchema {
    let legacy = Layout::new(
        "legacy",
        &[
            ("idtipo", C("idtipo")),
            ("tipo", C("tipo")),
            ("nomecodigo", C("nomecodigo")),
            ("Cabecalho", C("cabecalho")),
            ("idPARTE", C("idparte")),
            ("PARTE", C("parte")),
            ("PARTETEXTO", C("partetexto")),
            ("idtitulo", C("idtitulo")),
            ("titulo", C("titulo")),
            ("titulotexto", C("titulotexto")),
            ("idcapitulo", C("idcapitulo")),
            ("capitulo", C("capitulo")),
            ("capitulotexto", C("capitulotexto")),
            ("idsecao", C("idsecao")),
            ("secao", C("secao")),
            ("secaotexto", C("secaotexto")),
            ("idsubsecao", C("idsubsecao")),
            ("subsecao", C("subsecao")),
            ("subsecaotexto", C("subsecaotexto")),
            ("num_artigo", C("num_artigo")),
            ("Artigos", C("artigos")),
            ("Ordem", C("ordem")),
        ],
    );

    FamilySchema {
        family: Family::Laws,
        table: "vade_mecum_leis",
        key_column: "id",
        columns: LAWS_COLUMNS,
        required: &["nomecodigo"],
        natural_key: &["nomecodigo", "num_artigo", "artigos"],
        group_column: "nomecodigo",
        strict_trailing: false,
        layouts: vec![legacy.with_leading_identifier("with_id", "id"), legacy],
    }
}

fn jurisprudence_schema() -> FamilySchema {
    let split_statement = Layout::new(
        "split_statement",
        &[
            ("idtipo", C("idtipo")),
            ("tipo", C("tipo")),
            ("idcodigo", C("idcodigo")),
            ("nomecodigo", C("nomecodigo")),
            ("Cabecalho", C("cabecalho")),
            ("Tipo", C("tipo_descricao")),
            ("idramo", C("idramo")),
            ("ramotexto", C("ramotexto")),
            ("idassunto", C("idassunto")),
            ("assuntotexto", C("assuntotexto")),
            ("idenunciado", C("idenunciado")),
            ("Enunciado", S("enunciado")),
            ("Enunciado1", S("enunciado")),
            ("Enunciado2", S("enunciado")),
            ("Enunciado3", S("enunciado")),
            ("Enunciado4", S("enunciado")),
            ("Enunciado5", S("enunciado")),
            ("Enunciado6", S("enunciado")),
            ("idsecao", C("idsecao")),
            ("secao", C("secao")),
            ("secaotexto", C("secaotexto")),
            ("idsubsecao", C("idsubsecao")),
            ("subsecao", C("subsecao")),
            ("subsecaotexto", C("subsecaotexto")),
            ("num_artigo", C("num_artigo")),
            ("Normativo", C("normativo")),
            ("Ordem", C("ordem")),
        ],
    );

    FamilySchema {
        family: Family::Jurisprudence,
        table: "vade_mecum_jurisprudencia",
        key_column: "id",
        columns: JURISPRUDENCE_COLUMNS,
        required: &["nomecodigo"],
        natural_key: &["nomecodigo", "normativo", "num_artigo", "enunciado"],
        group_column: "nomecodigo",
        strict_trailing: false,
        layouts: vec![
            split_statement.with_leading_identifier("split_statement_with_id", "id"),
            split_statement,
        ],
    }
}

fn constitution_schema() -> FamilySchema {
    let legacy = Layout::new(
        "legacy",
        &[
            ("idtipo", C("idtipo")),
            ("tipo", C("tipo")),
            ("cabecalho", C("cabecalho")),
            ("idtitulo", C("idtitulo")),
            ("titulo", C("titulo")),
            ("textodotitulo", C("textodotitulo")),
            ("idcapitulo", C("idcapitulo")),
            ("capítulo", C("capitulo")),
            ("textocapítulo", C("textocapitulo")),
            ("idsecao", C("idsecao")),
            ("secao", C("secao")),
            ("texttosecao", C("textosecao")),
            ("idsubsecao", C("idsubsecao")),
            ("subsecao", C("subsecao")),
            ("subsecaotexto", C("textosubsecao")),
            ("Normativo", C("normativo")),
        ],
    );

    FamilySchema {
        family: Family::Constitution,
        table: "vade_mecum_constituicao",
        key_column: "registro_id",
        columns: CONSTITUTION_COLUMNS,
        required: &["normativo"],
        natural_key: &["normativo"],
        group_column: "titulo",
        strict_trailing: false,
        layouts: vec![legacy],
    }
}

fn exam_schema() -> FamilySchema {
    let legacy = Layout::new(
        "legacy",
        &[
            ("idtipo", C("idtipo")),
            ("tipo", C("tipo")),
            ("nomecodigo", C("nomecodigo")),
            ("Cabecalho", C("cabecalho")),
            ("titulo", C("titulo")),
            ("titulotexto", C("titulotexto")),
            ("TÍTULO", C("titulo_label")),
            ("capitulo", C("capitulo")),
            ("capitulotexto", C("capitulotexto")),
            ("CAPÍTULO", C("capitulo_label")),
            ("secao", C("secao")),
            ("secaotexto", C("secaotexto")),
            ("Seção", C("secao_label")),
            ("subsecao", C("subsecao")),
            ("subsecaotexto", C("subsecaotexto")),
            ("Subseção", C("subsecao_label")),
            ("num_artigo", C("num_artigo")),
            ("Artigos", C("artigos")),
        ],
    );

    FamilySchema {
        family: Family::Exam,
        table: "vade_mecum_oab",
        key_column: "id",
        columns: EXAM_COLUMNS,
        required: &["nomecodigo"],
        natural_key: &["nomecodigo", "num_artigo", "artigos"],
        group_column: "nomecodigo",
        strict_trailing: false,
        layouts: vec![legacy.with_leading_identifier("with_id", "id"), legacy],
    }
}
