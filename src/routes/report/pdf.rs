use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use crate::error::AppError;

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 40;
const LINE_HEIGHT: i64 = 12;
const FONT_SIZE: i64 = 9;
const TITLE_SIZE: i64 = 14;
const LINES_PER_PAGE: usize = 60;

/// Courier 标准字体只支持 Latin-1，其余字符替换为 `?`
fn sanitize(line: &str) -> String {
    line.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .collect()
}

fn pdf_error(e: impl std::fmt::Display) -> AppError {
    AppError::Internal(format!("failed to render pdf: {}", e))
}

/// 把若干行文本渲染为等宽字体的 PDF 文档
pub fn render(title: &str, subtitle: &str, lines: &[String]) -> Result<Vec<u8>, AppError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let empty = Vec::new();
    let chunks: Vec<&[String]> = if lines.is_empty() {
        vec![empty.as_slice()]
    } else {
        lines.chunks(LINES_PER_PAGE).collect()
    };
    let page_count = chunks.len();

    let mut kids: Vec<Object> = Vec::with_capacity(page_count);
    for (index, chunk) in chunks.into_iter().enumerate() {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), Object::Integer(TITLE_SIZE)]),
            Operation::new("TL", vec![Object::Integer(LINE_HEIGHT)]),
            Operation::new(
                "Td",
                vec![
                    Object::Integer(MARGIN),
                    Object::Integer(PAGE_HEIGHT - MARGIN - TITLE_SIZE),
                ],
            ),
            Operation::new("Tj", vec![Object::string_literal(sanitize(title))]),
            Operation::new("Tf", vec!["F1".into(), Object::Integer(FONT_SIZE)]),
            Operation::new("T*", vec![]),
            Operation::new(
                "Tj",
                vec![Object::string_literal(sanitize(&format!(
                    "{}   page {}/{}",
                    subtitle,
                    index + 1,
                    page_count
                )))],
            ),
            Operation::new("T*", vec![]),
        ];
        for line in chunk {
            operations.push(Operation::new("T*", vec![]));
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal(sanitize(line))],
            ));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().map_err(pdf_error)?,
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_count as i64,
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(PAGE_WIDTH),
            Object::Integer(PAGE_HEIGHT),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).map_err(pdf_error)?;
    Ok(buffer)
}
