extern crate argparse;
extern crate gopher_render;
use argparse::{ArgumentParser, Store, StoreOption, StoreTrue};
use gopher_render::{config, Converter, Placement};
use std::io;
use std::io::{Read, Write};

fn make_converter(
    width: usize,
    gopher_host: Option<String>,
    gopher_port: u16,
    after_block: bool,
    keep_padding: bool,
) -> gopher_render::Result<Converter> {
    let conf = match gopher_host {
        Some(host) => config::gophermap(host, gopher_port),
        None => config::text(),
    };
    let conf = if after_block {
        conf.link_placement(Placement::AfterBlock)
            .image_placement(Placement::AfterBlock)
    } else {
        conf
    };
    conf.width(width).optimise(!keep_padding).build()
}

fn translate<R>(converter: &Converter, mut input: R, markdown: bool) -> gopher_render::Result<String>
where
    R: io::Read,
{
    if markdown {
        let mut text = String::new();
        input.read_to_string(&mut text)?;
        #[cfg(feature = "markdown")]
        return Ok(converter.convert_markdown(&text));
        #[cfg(not(feature = "markdown"))]
        {
            log::warn!("Built without the markdown feature; treating input as HTML");
            return Ok(converter.convert(&text));
        }
    }
    converter.string_from_read(input)
}

fn main() {
    env_logger::init();

    let mut infile: Option<String> = None;
    let mut outfile: Option<String> = None;
    let mut width: usize = config::DEFAULT_WIDTH;
    let mut gopher_host: Option<String> = None;
    let mut gopher_port: u16 = gopher_render::gopher::DEFAULT_GOPHER_PORT;
    let mut after_block = false;
    let mut keep_padding = false;
    let mut markdown = false;

    {
        let mut ap = ArgumentParser::new();
        ap.set_description("Convert HTML or Markdown to plain text or a gophermap");
        ap.refer(&mut infile).add_argument(
            "infile",
            StoreOption,
            "Input file (default is standard input)",
        );
        ap.refer(&mut width).add_option(
            &["-w", "--width"],
            Store,
            "Column width to format to (default is 67)",
        );
        ap.refer(&mut outfile).add_option(
            &["-o", "--output"],
            StoreOption,
            "Output file (default is standard output)",
        );
        ap.refer(&mut gopher_host).add_option(
            &["-g", "--gophermap"],
            StoreOption,
            "Write a gophermap, with relative links on this host",
        );
        ap.refer(&mut gopher_port).add_option(
            &["-p", "--port"],
            Store,
            "Port for relative links in a gophermap (default is 70)",
        );
        ap.refer(&mut after_block).add_option(
            &["-b", "--after-block"],
            StoreTrue,
            "List links after each block instead of at the end",
        );
        ap.refer(&mut keep_padding).add_option(
            &["--keep-padding"],
            StoreTrue,
            "Don't strip trailing spaces from lines",
        );
        ap.refer(&mut markdown)
            .add_option(&["-m", "--markdown"], StoreTrue, "Input is Markdown");
        ap.parse_args_or_exit();
    }

    let converter = match make_converter(width, gopher_host, gopher_port, after_block, keep_padding) {
        Ok(converter) => converter,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    let result = match infile {
        None => {
            let stdin = io::stdin();
            let data = translate(&converter, &mut stdin.lock(), markdown);
            data
        }
        Some(name) => {
            let mut file = std::fs::File::open(name).expect("Tried to open file");
            translate(&converter, &mut file, markdown)
        }
    };
    let data = match result {
        Ok(data) => data,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    match outfile {
        None => {
            println!("{}", data);
        }
        Some(name) => {
            let mut file = std::fs::File::create(name).expect("Tried to create file");
            write!(file, "{}", data).unwrap();
        }
    };
}
