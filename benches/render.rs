#![feature(test)]
extern crate gopher_render;
extern crate test;

use ::test::Bencher;

use gopher_render::{config, from_read};

fn make_html(content: &str) -> String {
    String::from("<html><body>") + content + "</body></html>"
}

fn make_list(item: &str, depth: usize, items: usize) -> String {
    let mut result = String::from("<ul>");
    for _ in 0..items {
        result.push_str("<li>");
        result.push_str(item);
        if depth > 1 {
            result.push_str(&make_list(item, depth - 1, items));
        }
        result.push_str("</li>");
    }
    result.push_str("</ul>");
    result
}

fn make_links(paragraphs: usize) -> String {
    let mut result = String::new();
    for i in 0..paragraphs {
        result.push_str(&format!(
            "<p>Paragraph {i} links to <a href=\"/docs/{i}.txt\">a text file</a> \
             and <a href=\"https://example.com/{i}\">a web page</a>.</p>"
        ));
    }
    result
}

#[bench]
fn bench_empty(b: &mut Bencher) {
    b.iter(|| from_read(make_html("").as_bytes(), 80));
}

#[bench]
fn bench_list_2_4(b: &mut Bencher) {
    b.iter(|| from_read(make_html(&make_list("item", 2, 4)).as_bytes(), 80));
}

#[bench]
fn bench_list_4_4(b: &mut Bencher) {
    b.iter(|| from_read(make_html(&make_list("item", 4, 4)).as_bytes(), 80));
}

#[bench]
fn bench_links_text_50(b: &mut Bencher) {
    b.iter(|| from_read(make_html(&make_links(50)).as_bytes(), 80));
}

#[bench]
fn bench_links_gophermap_50(b: &mut Bencher) {
    let converter = config::gophermap("gopher.example.org", 70)
        .build()
        .unwrap();
    let html = make_html(&make_links(50));
    b.iter(|| converter.convert(&html));
}
