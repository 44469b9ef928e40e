//! Office Open XML (`.docx`) serialization.
//!
//! A `.docx` file is a ZIP package of XML parts. The writer produces the
//! minimal set of parts word processors need: the main document, styles,
//! settings, one header and one footer part per section that has them, and
//! a media part per embedded picture, tied together by relationship parts and
//! the content-type manifest.

use std::{
    fmt::Write as _,
    io::{Cursor, Write as _},
};

use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use super::{
    ExportError,
    document::{
        Alignment, Block, Border, BorderStyle, DEFAULT_COLOR, DEFAULT_SIZE, Document, FONT, Field,
        ImageFormat, ImageRun, PageSetup, Paragraph, Run, RunStyle, Section, Table,
    },
};

/// A4 page size, in twips.
const PAGE_WIDTH: u32 = 11_906;
const PAGE_HEIGHT: u32 = 16_838;

/// Width between the page margins, in twips.
const TEXT_WIDTH: u32 = PAGE_WIDTH - 2 * 700;

/// Distance of the header and footer from the page edge, in twips.
const HEADER_DISTANCE: u32 = 708;

/// English Metric Units per pixel at 96 dpi.
const EMU_PER_PIXEL: u64 = 9_525;

const NS_MAIN: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_DRAWING: &str =
    "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";

const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const REL_SETTINGS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/settings";
const REL_HEADER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/header";
const REL_FOOTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer";
const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

const CT_DOCUMENT: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
const CT_STYLES: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";
const CT_SETTINGS: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.settings+xml";
const CT_HEADER: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml";
const CT_FOOTER: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml";
const CT_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Serialize `document` as a `.docx` package.
///
/// # Errors
///
/// Returns an [`ExportError`] if the package cannot be written.
pub fn write(document: &Document) -> Result<Vec<u8>, ExportError> {
    let mut package = Package::default();
    let body = document_xml(document, &mut package);

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut add = |name: &str, data: &[u8]| -> Result<(), ExportError> {
        zip.start_file(name, options)?;
        zip.write_all(data)?;
        Ok(())
    };

    add("[Content_Types].xml", package.content_types().as_bytes())?;
    add("_rels/.rels", root_relationships().as_bytes())?;
    add("word/document.xml", body.as_bytes())?;
    add("word/styles.xml", styles_xml().as_bytes())?;
    add("word/settings.xml", settings_xml().as_bytes())?;
    add(
        "word/_rels/document.xml.rels",
        package.document_relationships().as_bytes(),
    )?;
    for part in &package.parts {
        add(&format!("word/{}", part.name), part.xml.as_bytes())?;
    }
    for media in &package.media {
        add(&format!("word/{}", media.name), &media.data)?;
    }

    let cursor = zip.finish()?;
    tracing::debug!(
        parts = package.parts.len(),
        media = package.media.len(),
        "wrote docx package"
    );
    Ok(cursor.into_inner())
}

/// An XML part other than the fixed ones.
struct Part {
    name: String,
    content_type: &'static str,
    xml: String,
}

struct Media {
    name: String,
    data: Vec<u8>,
}

struct Relationship {
    id: String,
    kind: &'static str,
    target: String,
}

#[derive(Default)]
struct Package {
    relationships: Vec<Relationship>,
    parts: Vec<Part>,
    media: Vec<Media>,
    formats: Vec<ImageFormat>,
    drawings: u32,
}

impl Package {
    fn relate(&mut self, kind: &'static str, target: String) -> String {
        // rId1 and rId2 are taken by styles and settings
        let id = format!("rId{}", self.relationships.len() + 3);
        self.relationships.push(Relationship {
            id: id.clone(),
            kind,
            target,
        });
        id
    }

    fn add_part(&mut self, prefix: &str, content_type: &'static str, xml: String) -> String {
        let index = self
            .parts
            .iter()
            .filter(|part| part.content_type == content_type)
            .count()
            + 1;
        let name = format!("{prefix}{index}.xml");
        let kind = if content_type == CT_HEADER {
            REL_HEADER
        } else {
            REL_FOOTER
        };
        let id = self.relate(kind, name.clone());
        self.parts.push(Part {
            name,
            content_type,
            xml,
        });
        id
    }

    fn add_image(&mut self, image: &ImageRun) -> (String, u32) {
        let name = format!(
            "media/image{}.{}",
            self.media.len() + 1,
            image.format.extension()
        );
        let id = self.relate(REL_IMAGE, name.clone());
        self.media.push(Media {
            name,
            data: image.data.clone(),
        });
        if !self.formats.contains(&image.format) {
            self.formats.push(image.format);
        }
        self.drawings += 1;
        (id, self.drawings)
    }

    fn content_types(&self) -> String {
        let mut out = String::from(XML_DECLARATION);
        out.push_str(
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        );
        let _ = write!(
            out,
            r#"<Default Extension="rels" ContentType="{CT_RELATIONSHIPS}"/><Default Extension="xml" ContentType="application/xml"/>"#
        );
        for format in &self.formats {
            let _ = write!(
                out,
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                format.extension(),
                format.content_type()
            );
        }
        for (name, content_type) in [
            ("document.xml", CT_DOCUMENT),
            ("styles.xml", CT_STYLES),
            ("settings.xml", CT_SETTINGS),
        ] {
            let _ = write!(
                out,
                r#"<Override PartName="/word/{name}" ContentType="{content_type}"/>"#
            );
        }
        for part in &self.parts {
            let _ = write!(
                out,
                r#"<Override PartName="/word/{}" ContentType="{}"/>"#,
                part.name, part.content_type
            );
        }
        out.push_str("</Types>");
        out
    }

    fn document_relationships(&self) -> String {
        let mut out = String::from(XML_DECLARATION);
        let _ = write!(
            out,
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL_STYLES}" Target="styles.xml"/><Relationship Id="rId2" Type="{REL_SETTINGS}" Target="settings.xml"/>"#
        );
        for rel in &self.relationships {
            let _ = write!(
                out,
                r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
                rel.id, rel.kind, rel.target
            );
        }
        out.push_str("</Relationships>");
        out
    }
}

fn root_relationships() -> String {
    format!(
        r#"{XML_DECLARATION}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL_OFFICE_DOCUMENT}" Target="word/document.xml"/></Relationships>"#
    )
}

fn styles_xml() -> String {
    format!(
        r#"{XML_DECLARATION}<w:styles xmlns:w="{NS_MAIN}"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="{FONT}" w:hAnsi="{FONT}" w:eastAsia="{FONT}" w:cs="{FONT}"/><w:color w:val="{DEFAULT_COLOR}"/><w:sz w:val="{DEFAULT_SIZE}"/><w:szCs w:val="{DEFAULT_SIZE}"/></w:rPr></w:rPrDefault><w:pPrDefault/></w:docDefaults><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style></w:styles>"#
    )
}

fn settings_xml() -> String {
    format!(
        r#"{XML_DECLARATION}<w:settings xmlns:w="{NS_MAIN}"><w:defaultTabStop w:val="720"/><w:compat><w:compatSetting w:name="compatibilityMode" w:uri="http://schemas.microsoft.com/office/word" w:val="15"/></w:compat></w:settings>"#
    )
}

fn document_xml(document: &Document, package: &mut Package) -> String {
    let mut out = String::from(XML_DECLARATION);
    let _ = write!(
        out,
        r#"<w:document xmlns:w="{NS_MAIN}" xmlns:r="{NS_REL}" xmlns:wp="{NS_DRAWING}" xmlns:a="{NS_A}" xmlns:pic="{NS_PIC}"><w:body>"#
    );

    let count = document.sections.len();
    for (index, section) in document.sections.iter().enumerate() {
        for block in &section.blocks {
            write_block(&mut out, block, package);
        }

        let properties = section_properties(section, package);
        if index + 1 < count {
            // all but the last section end with a paragraph carrying their
            // properties
            let _ = write!(out, "<w:p><w:pPr>{properties}</w:pPr></w:p>");
        } else {
            out.push_str(&properties);
        }
    }

    out.push_str("</w:body></w:document>");
    out
}

fn section_properties(section: &Section, package: &mut Package) -> String {
    let mut out = String::from("<w:sectPr>");

    if let Some(header) = &section.header {
        let xml = header_footer_xml("hdr", header);
        let id = package.add_part("header", CT_HEADER, xml);
        let _ = write!(out, r#"<w:headerReference w:type="default" r:id="{id}"/>"#);
    }
    if let Some(footer) = &section.footer {
        let xml = header_footer_xml("ftr", footer);
        let id = package.add_part("footer", CT_FOOTER, xml);
        let _ = write!(out, r#"<w:footerReference w:type="default" r:id="{id}"/>"#);
    }

    out.push_str(r#"<w:type w:val="nextPage"/>"#);
    write_page_setup(&mut out, &section.page);
    out.push_str("</w:sectPr>");
    out
}

fn write_page_setup(out: &mut String, page: &PageSetup) {
    let margin = page.margin;
    let _ = write!(
        out,
        r#"<w:pgSz w:w="{PAGE_WIDTH}" w:h="{PAGE_HEIGHT}"/><w:pgMar w:top="{margin}" w:right="{margin}" w:bottom="{margin}" w:left="{margin}" w:header="{HEADER_DISTANCE}" w:footer="{HEADER_DISTANCE}" w:gutter="0"/>"#
    );
    if let Some(border) = &page.border {
        out.push_str("<w:pgBorders>");
        for side in ["top", "left", "bottom", "right"] {
            write_border(out, side, &border.line, border.space);
        }
        out.push_str("</w:pgBorders>");
    }
}

fn write_border(out: &mut String, side: &str, border: &Border, space: u32) {
    let style = match border.style {
        BorderStyle::Single => "single",
        BorderStyle::Double => "double",
    };
    let _ = write!(
        out,
        r#"<w:{side} w:val="{style}" w:sz="{}" w:space="{space}" w:color="{}"/>"#,
        border.size,
        escape(&border.color)
    );
}

fn header_footer_xml(root: &str, paragraph: &Paragraph) -> String {
    let mut out = String::from(XML_DECLARATION);
    let _ = write!(out, r#"<w:{root} xmlns:w="{NS_MAIN}" xmlns:r="{NS_REL}">"#);
    write_paragraph(&mut out, paragraph, None);
    let _ = write!(out, "</w:{root}>");
    out
}

fn write_block(out: &mut String, block: &Block, package: &mut Package) {
    match block {
        Block::Paragraph(paragraph) => write_paragraph(out, paragraph, Some(package)),
        Block::Table(table) => write_table(out, table, package),
    }
}

/// Writes a paragraph. Pictures are only embedded when a `package` is given to
/// hold them.
fn write_paragraph(out: &mut String, paragraph: &Paragraph, mut package: Option<&mut Package>) {
    out.push_str("<w:p><w:pPr>");
    if paragraph.page_break_before {
        out.push_str("<w:pageBreakBefore/>");
    }
    if let Some(after) = paragraph.spacing_after {
        let _ = write!(out, r#"<w:spacing w:after="{after}"/>"#);
    }
    if let Some(alignment) = paragraph.alignment {
        let value = match alignment {
            Alignment::Center => "center",
            Alignment::Justified => "both",
        };
        let _ = write!(out, r#"<w:jc w:val="{value}"/>"#);
    }
    out.push_str("</w:pPr>");

    for run in &paragraph.runs {
        match run {
            Run::Text(text) => {
                out.push_str("<w:r>");
                write_run_style(out, &text.style);
                let _ = write!(
                    out,
                    r#"<w:t xml:space="preserve">{}</w:t></w:r>"#,
                    escape(&text.text)
                );
            }
            Run::Break => out.push_str("<w:r><w:br/></w:r>"),
            Run::Field(field, style) => {
                let instruction = match field {
                    Field::Page => "PAGE",
                    Field::NumPages => "NUMPAGES",
                };
                let _ = write!(out, r#"<w:fldSimple w:instr=" {instruction} "><w:r>"#);
                write_run_style(out, style);
                out.push_str("<w:t>1</w:t></w:r></w:fldSimple>");
            }
            Run::Image(image) => match package.as_deref_mut() {
                Some(package) => write_image(out, image, package),
                None => tracing::debug!("skipping picture outside the document body"),
            },
        }
    }

    out.push_str("</w:p>");
}

fn write_run_style(out: &mut String, style: &RunStyle) {
    let _ = write!(
        out,
        r#"<w:rPr><w:rFonts w:ascii="{FONT}" w:hAnsi="{FONT}" w:cs="{FONT}"/>"#
    );
    if style.bold {
        out.push_str("<w:b/><w:bCs/>");
    }
    if style.italic {
        out.push_str("<w:i/><w:iCs/>");
    }
    let _ = write!(
        out,
        r#"<w:color w:val="{}"/><w:sz w:val="{size}"/><w:szCs w:val="{size}"/>"#,
        escape(&style.color),
        size = style.size
    );
    if let Some(underline) = &style.underline {
        match &underline.color {
            Some(color) => {
                let _ = write!(out, r#"<w:u w:val="single" w:color="{}"/>"#, escape(color));
            }
            None => out.push_str(r#"<w:u w:val="single"/>"#),
        }
    }
    out.push_str("</w:rPr>");
}

fn write_image(out: &mut String, image: &ImageRun, package: &mut Package) {
    let (rel_id, drawing) = package.add_image(image);
    let cx = u64::from(image.width) * EMU_PER_PIXEL;
    let cy = u64::from(image.height) * EMU_PER_PIXEL;
    let name = format!("Picture {drawing}");

    let _ = write!(
        out,
        r#"<w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0"><wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="{drawing}" name="{name}"/><wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr><a:graphic><a:graphicData uri="{NS_PIC}"><pic:pic><pic:nvPicPr><pic:cNvPr id="{drawing}" name="{name}"/><pic:cNvPicPr/></pic:nvPicPr><pic:blipFill><a:blip r:embed="{rel_id}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill><pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#
    );
}

fn write_table(out: &mut String, table: &Table, package: &mut Package) {
    out.push_str(r#"<w:tbl><w:tblPr><w:tblW w:w="5000" w:type="pct"/></w:tblPr><w:tblGrid>"#);
    if let Some(first) = table.rows.first() {
        for cell in &first.cells {
            let _ = write!(
                out,
                r#"<w:gridCol w:w="{}"/>"#,
                TEXT_WIDTH * cell.width_percent / 100
            );
        }
    }
    out.push_str("</w:tblGrid>");

    for row in &table.rows {
        out.push_str("<w:tr>");
        for cell in &row.cells {
            // table widths are in fiftieths of a percent
            let _ = write!(
                out,
                r#"<w:tc><w:tcPr><w:tcW w:w="{}" w:type="pct"/>"#,
                cell.width_percent * 50
            );
            if let Some(border) = &cell.border {
                out.push_str("<w:tcBorders>");
                for side in ["top", "left", "bottom", "right"] {
                    write_border(out, side, border, 0);
                }
                out.push_str("</w:tcBorders>");
            }
            if let Some(fill) = &cell.fill {
                let _ = write!(
                    out,
                    r#"<w:shd w:val="clear" w:color="auto" w:fill="{}"/>"#,
                    escape(fill)
                );
            }
            if cell.vertical_center {
                out.push_str(r#"<w:vAlign w:val="center"/>"#);
            }
            out.push_str("</w:tcPr>");

            if cell.paragraphs.is_empty() {
                out.push_str("<w:p/>");
            }
            for paragraph in &cell.paragraphs {
                write_paragraph(out, paragraph, Some(package));
            }
            out.push_str("</w:tc>");
        }
        out.push_str("</w:tr>");
    }
    out.push_str("</w:tbl>");
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // characters XML 1.0 cannot represent at all
            c if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') => {}
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::io::Read as _;

    use zip::ZipArchive;

    use super::*;
    use crate::export::document::{PageBorder, TextRun};

    fn section(blocks: Vec<Block>) -> Section {
        Section {
            page: PageSetup {
                margin: 700,
                border: Some(PageBorder {
                    line: Border {
                        style: BorderStyle::Double,
                        size: 24,
                        color: "16A34A".to_string(),
                    },
                    space: 15,
                }),
            },
            header: Some(Paragraph::new(vec![TextRun::new("Assignment: 1").into()])),
            footer: Some(Paragraph::new(vec![Run::Field(
                Field::Page,
                RunStyle::default(),
            )])),
            blocks,
        }
    }

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    fn part_names(bytes: &[u8]) -> Vec<String> {
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        archive.file_names().map(ToString::to_string).collect()
    }

    #[test]
    fn package_contains_required_parts() {
        let document = Document {
            sections: vec![section(vec![Paragraph::empty().into()])],
        };
        let bytes = write(&document).unwrap();
        let names = part_names(&bytes);

        for required in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/document.xml",
            "word/styles.xml",
            "word/settings.xml",
            "word/_rels/document.xml.rels",
            "word/header1.xml",
            "word/footer1.xml",
        ] {
            assert!(names.iter().any(|n| n == required), "missing {required}");
        }
    }

    #[test]
    fn text_is_escaped_and_styled() {
        let run = TextRun::new("Q. <a> & b").bold().size(28);
        let document = Document {
            sections: vec![section(vec![Paragraph::new(vec![run.into()]).into()])],
        };
        let xml = read_part(&write(&document).unwrap(), "word/document.xml");

        assert!(xml.contains("Q. &lt;a&gt; &amp; b"));
        assert!(xml.contains("<w:b/>"));
        assert!(xml.contains(r#"<w:sz w:val="28"/>"#));
        assert!(xml.contains(r#"w:ascii="Inter""#));
    }

    #[test]
    fn page_border_and_margins_are_written() {
        let document = Document {
            sections: vec![section(Vec::new())],
        };
        let xml = read_part(&write(&document).unwrap(), "word/document.xml");

        assert!(xml.contains(
            r#"<w:top w:val="double" w:sz="24" w:space="15" w:color="16A34A"/>"#
        ));
        assert!(xml.contains(r#"w:top="700""#));
    }

    #[test]
    fn earlier_sections_end_with_a_section_paragraph() {
        let document = Document {
            sections: vec![section(Vec::new()), section(Vec::new())],
        };
        let xml = read_part(&write(&document).unwrap(), "word/document.xml");

        assert_eq!(xml.matches("<w:sectPr>").count(), 2);
        assert!(xml.contains("<w:p><w:pPr><w:sectPr>"));
        assert!(xml.ends_with("</w:sectPr></w:body></w:document>"));
    }

    #[test]
    fn headers_and_footers_are_related() {
        let document = Document {
            sections: vec![section(Vec::new())],
        };
        let bytes = write(&document).unwrap();
        let rels = read_part(&bytes, "word/_rels/document.xml.rels");
        let footer = read_part(&bytes, "word/footer1.xml");

        assert!(rels.contains(r#"Target="header1.xml""#));
        assert!(rels.contains(r#"Target="footer1.xml""#));
        assert!(footer.contains(r#"<w:fldSimple w:instr=" PAGE ">"#));
    }

    #[test]
    fn images_become_media_parts() {
        let image = ImageRun {
            data: vec![0x89, b'P', b'N', b'G'],
            format: ImageFormat::Png,
            width: 400,
            height: 300,
        };
        let document = Document {
            sections: vec![section(vec![Paragraph::new(vec![Run::Image(image)]).into()])],
        };
        let bytes = write(&document).unwrap();

        let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let mut media = Vec::new();
        archive
            .by_name("word/media/image1.png")
            .unwrap()
            .read_to_end(&mut media)
            .unwrap();
        assert_eq!(media, vec![0x89, b'P', b'N', b'G']);

        let xml = read_part(&bytes, "word/document.xml");
        assert!(xml.contains(r#"<wp:extent cx="3810000" cy="2857500"/>"#));
        let types = read_part(&bytes, "[Content_Types].xml");
        assert!(types.contains(r#"<Default Extension="png" ContentType="image/png"/>"#));
    }

    #[test]
    fn control_characters_are_dropped() {
        assert_eq!(escape("a\u{1}b\tc"), "ab\tc");
    }
}
