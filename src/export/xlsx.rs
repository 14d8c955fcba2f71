use std::collections::HashSet;
use std::fmt::Write as _;
use std::io::{Cursor, Seek, Write};

use anyhow::{Context, Result, bail};
use time::macros::datetime;
use time::{OffsetDateTime, PrimitiveDateTime};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::export::Layout;
use crate::export::columns::{CellValue, Table};

pub const SHEET_NAME: &str = "Rules";
const TABLE_STYLE: &str = "TableStyleMedium2";
const MAX_CELL_CHARS: usize = 32_767;
const DATE_STYLE_INDEX: u32 = 1;

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

pub fn to_bytes(table: &Table, layout: Layout) -> Result<Vec<u8>> {
    let cursor = write_workbook(table, layout, Cursor::new(Vec::new()))?;
    Ok(cursor.into_inner())
}

pub fn write_workbook<W: Write + Seek>(table: &Table, layout: Layout, writer: W) -> Result<W> {
    let header = match layout {
        Layout::Plain => table.header.clone(),
        Layout::Table => {
            if table.width() == 0 {
                bail!("テーブル形式には少なくとも1列が必要です");
            }
            unique_table_names(&table.header)
        }
    };

    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut parts: Vec<(&str, String)> = vec![
        ("[Content_Types].xml", content_types(layout)),
        ("_rels/.rels", root_rels()),
        ("xl/workbook.xml", workbook()),
        ("xl/_rels/workbook.xml.rels", workbook_rels()),
        ("xl/styles.xml", styles()),
        ("xl/worksheets/sheet1.xml", worksheet(&header, table, layout)),
    ];
    if layout == Layout::Table {
        parts.push(("xl/worksheets/_rels/sheet1.xml.rels", sheet_rels()));
        parts.push(("xl/tables/table1.xml", table_part(&header, table.rows.len())));
    }

    for (name, body) in parts {
        zip.start_file(name, options)
            .with_context(|| format!("ブックの部品を作成できませんでした: {name}"))?;
        zip.write_all(body.as_bytes())
            .with_context(|| format!("ブックの部品を書き込めませんでした: {name}"))?;
    }

    zip.finish().context("ブック(zip)の書き込みを完了できませんでした")
}

pub fn column_name(index: usize) -> String {
    let mut chars = Vec::new();
    let mut n = index;
    loop {
        chars.push(char::from(b'A' + (n % 26) as u8));
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    chars.iter().rev().collect()
}

fn cell_ref(col: usize, row: usize) -> String {
    format!("{}{}", column_name(col), row)
}

fn data_range(width: usize, rows: usize) -> String {
    if width == 0 {
        return "A1".to_string();
    }
    format!("A1:{}", cell_ref(width - 1, rows.max(1)))
}

fn unique_table_names(header: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    header
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let base = if name.trim().is_empty() {
                format!("Column{}", i + 1)
            } else {
                name.clone()
            };
            let mut candidate = base.clone();
            let mut n = 2;
            while !seen.insert(candidate.to_lowercase()) {
                candidate = format!("{base}{n}");
                n += 1;
            }
            candidate
        })
        .collect()
}

fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars().take(MAX_CELL_CHARS) {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if (c as u32) < 0x20 || c == '\u{FFFE}' || c == '\u{FFFF}' => {}
            c => out.push(c),
        }
    }
    out
}

// Wall clock at the reported offset, never shifted to UTC.
fn date_serial(dt: OffsetDateTime) -> f64 {
    let epoch = datetime!(1899-12-30 00:00:00);
    (PrimitiveDateTime::new(dt.date(), dt.time()) - epoch).as_seconds_f64() / 86_400.0
}

fn push_text_cell(out: &mut String, reference: &str, text: &str) {
    let _ = write!(
        out,
        r#"<c r="{reference}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
        escape_xml(text)
    );
}

fn worksheet(header: &[String], table: &Table, layout: Layout) -> String {
    let mut out = String::new();
    out.push_str(XML_DECL);
    let _ = write!(
        out,
        r#"<worksheet xmlns="{NS_MAIN}" xmlns:r="{NS_REL}"><dimension ref="{}"/>"#,
        data_range(header.len(), table.rows.len() + 1)
    );
    out.push_str("<sheetData>");

    out.push_str(r#"<row r="1">"#);
    for (col, name) in header.iter().enumerate() {
        push_text_cell(&mut out, &cell_ref(col, 1), name);
    }
    out.push_str("</row>");

    for (i, row) in table.rows.iter().enumerate() {
        let r = i + 2;
        let _ = write!(out, r#"<row r="{r}">"#);
        for (col, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let reference = cell_ref(col, r);
            match value {
                CellValue::Text(text) => push_text_cell(&mut out, &reference, text),
                CellValue::Date(dt) => {
                    let _ = write!(
                        out,
                        r#"<c r="{reference}" s="{DATE_STYLE_INDEX}"><v>{}</v></c>"#,
                        date_serial(*dt)
                    );
                }
                CellValue::Empty => {}
            }
        }
        out.push_str("</row>");
    }
    out.push_str("</sheetData>");

    if layout == Layout::Table {
        out.push_str(r#"<tableParts count="1"><tablePart r:id="rId1"/></tableParts>"#);
    }
    out.push_str("</worksheet>");
    out
}

fn table_part(header: &[String], record_count: usize) -> String {
    let range = data_range(header.len(), record_count + 1);
    let mut out = String::new();
    out.push_str(XML_DECL);
    let _ = write!(
        out,
        r#"<table xmlns="{NS_MAIN}" id="1" name="{SHEET_NAME}" displayName="{SHEET_NAME}" ref="{range}" headerRowCount="1" totalsRowShown="0">"#
    );
    let _ = write!(out, r#"<autoFilter ref="{range}"/>"#);
    let _ = write!(out, r#"<tableColumns count="{}">"#, header.len());
    for (i, name) in header.iter().enumerate() {
        let _ = write!(
            out,
            r#"<tableColumn id="{}" name="{}"/>"#,
            i + 1,
            escape_xml(name)
        );
    }
    out.push_str("</tableColumns>");
    let _ = write!(
        out,
        r#"<tableStyleInfo name="{TABLE_STYLE}" showFirstColumn="0" showLastColumn="0" showRowStripes="1" showColumnStripes="0"/>"#
    );
    out.push_str("</table>");
    out
}

fn content_types(layout: Layout) -> String {
    let mut out = String::new();
    out.push_str(XML_DECL);
    out.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    out.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    out.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    out.push_str(r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#);
    out.push_str(r#"<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#);
    out.push_str(r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#);
    if layout == Layout::Table {
        out.push_str(r#"<Override PartName="/xl/tables/table1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.table+xml"/>"#);
    }
    out.push_str("</Types>");
    out
}

fn root_rels() -> String {
    format!(
        r#"{XML_DECL}<Relationships xmlns="{NS_PKG_REL}"><Relationship Id="rId1" Type="{NS_REL}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
    )
}

fn workbook() -> String {
    format!(
        r#"{XML_DECL}<workbook xmlns="{NS_MAIN}" xmlns:r="{NS_REL}"><sheets><sheet name="{SHEET_NAME}" sheetId="1" r:id="rId1"/></sheets></workbook>"#
    )
}

fn workbook_rels() -> String {
    format!(
        r#"{XML_DECL}<Relationships xmlns="{NS_PKG_REL}"><Relationship Id="rId1" Type="{NS_REL}/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="{NS_REL}/styles" Target="styles.xml"/></Relationships>"#
    )
}

fn sheet_rels() -> String {
    format!(
        r#"{XML_DECL}<Relationships xmlns="{NS_PKG_REL}"><Relationship Id="rId1" Type="{NS_REL}/table" Target="../tables/table1.xml"/></Relationships>"#
    )
}

fn styles() -> String {
    format!(
        concat!(
            "{decl}<styleSheet xmlns=\"{ns}\">",
            "<numFmts count=\"1\"><numFmt numFmtId=\"164\" formatCode=\"yyyy-mm-dd\"/></numFmts>",
            "<fonts count=\"1\"><font><sz val=\"11\"/><name val=\"Calibri\"/><family val=\"2\"/></font></fonts>",
            "<fills count=\"2\"><fill><patternFill patternType=\"none\"/></fill><fill><patternFill patternType=\"gray125\"/></fill></fills>",
            "<borders count=\"1\"><border><left/><right/><top/><bottom/><diagonal/></border></borders>",
            "<cellStyleXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/></cellStyleXfs>",
            "<cellXfs count=\"2\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\" xfId=\"0\"/>",
            "<xf numFmtId=\"164\" fontId=\"0\" fillId=\"0\" borderId=\"0\" xfId=\"0\" applyNumberFormat=\"1\"/></cellXfs>",
            "<cellStyles count=\"1\"><cellStyle name=\"Normal\" xfId=\"0\" builtinId=\"0\"/></cellStyles>",
            "</styleSheet>"
        ),
        decl = XML_DECL,
        ns = NS_MAIN
    )
}
