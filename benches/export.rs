//! This bench test exports a long assignment with many styled pages and
//! pictures, and measures the markup transform on its own.

#![allow(missing_docs)]

use assignment::{
    Assignment, AssignmentDraft, Config, Cover, CoverRow,
    export::{export, transform},
};
use criterion::{BatchSize, Criterion, criterion_group, criterion_main};

const PIXEL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

/// A page mixing questions, answers and inline styling
fn page(n: usize) -> String {
    let mut page = String::new();
    for q in 1..=10 {
        page.push_str(&format!(
            "<div><b>Q. {n}.{q} Explain the <i>second law</i> of thermodynamics.</b></div>\
             <p><strong>Ans:</strong> Heat flows <span style=\"color: #dc2626\">spontaneously</span> \
             from hot to cold bodies.<br>Entropy of an isolated system never decreases.</p>"
        ));
    }
    page
}

fn assignment() -> Assignment {
    let mut assignment = Assignment::new(
        AssignmentDraft {
            cover: Cover {
                number: "7".to_string(),
                name: "Thermodynamics Problem Set".to_string(),
                course_name: "Thermodynamics".to_string(),
                course_code: "ME-210".to_string(),
                ..Cover::default()
            },
            max_file_size_mb: 5,
        },
        0,
    );
    assignment.add_cover_row(CoverRow::new("Group", "B"));
    assignment.set_page(0, page(0)).unwrap();
    for n in 1..50 {
        let index = assignment.add_page();
        assignment.set_page(index, page(n)).unwrap();
        assignment.insert_image(index, PIXEL).unwrap();
    }
    assignment
}

fn export_assignment(c: &mut Criterion) {
    let config = Config::default();
    c.bench_function("export 50 pages", |b| {
        b.iter_batched(
            assignment,
            |assignment| export(&assignment, &config).unwrap(),
            BatchSize::SmallInput,
        );
    });
}

fn transform_page(c: &mut Criterion) {
    let page = page(0);
    c.bench_function("transform page", |b| {
        b.iter(|| transform::page_paragraphs(&page));
    });
}

criterion_group!(benches, export_assignment, transform_page);
criterion_main!(benches);
