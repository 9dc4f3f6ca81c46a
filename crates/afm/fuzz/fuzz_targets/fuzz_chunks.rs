#![no_main]

use libfuzzer_sys::fuzz_target;
use std::hash::Hash;
use std::hash::Hasher;

#[derive(Debug, arbitrary::Arbitrary)]
struct Input {
    source: String,
    splits: Vec<usize>,
    options: afm::Options,
}

fuzz_target!(|input: Input| {
    let mut parser = afm::Parser::with_options(input.options.clone());
    parser.read_chunk(&input.source);
    let (want_metrics, want_warnings) = parser.finish();

    let mut parser = afm::Parser::with_options(input.options);
    for chunk in chunks(&input.source, &input.splits) {
        parser.read_chunk(chunk);
    }
    let (got_metrics, got_warnings) = parser.finish();

    if want_metrics == got_metrics && want_warnings == got_warnings {
        return;
    }
    write_input(&input.source);
    similar_asserts::assert_eq!(chunked: got_metrics, whole: want_metrics);
    similar_asserts::assert_eq!(chunked: got_warnings, whole: want_warnings);
});

/// Split the source at the provided offsets, rounded down to char boundaries.
fn chunks<'a>(source: &'a str, splits: &[usize]) -> Vec<&'a str> {
    let mut offsets: Vec<usize> = splits
        .iter()
        .map(|split| {
            let mut split = split % (source.len() + 1);
            while !source.is_char_boundary(split) {
                split -= 1;
            }
            split
        })
        .collect();
    offsets.push(0);
    offsets.push(source.len());
    offsets.sort();
    offsets.windows(2).map(|w| &source[w[0]..w[1]]).collect()
}

fn write_input(input: &str) {
    let dir = "crates/afm/corpus/fuzz";
    std::fs::create_dir_all(dir).unwrap();
    let path = format!["{dir}/fuzz_chunks_{:x}.afm", calculate_hash(input)];
    std::fs::write(path, input).unwrap();
}

fn calculate_hash(input: &str) -> u64 {
    let mut s = std::collections::hash_map::DefaultHasher::new();
    input.hash(&mut s);
    s.finish()
}
