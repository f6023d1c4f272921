// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_document(blocks: usize) -> String {
    let samples = [
        "∞∞∞text-a\nMeeting notes, remember to follow up on the release.\n",
        "∞∞∞json\n{\n  \"name\": \"blockpad\",\n  \"tags\": [\"a\", \"b\"],\n  \"nested\": {\"x\": 1}\n}\n",
        "∞∞∞py\nimport os\n\ndef main(args):\n    for a in args:\n        print(a)\n",
        "∞∞∞md\n# Heading\n\nSome **bold** text and a [link](http://example.com).\n",
        "∞∞∞rs\nfn main() {\n    let mut v = vec![1, 2, 3];\n    v.push(4);\n}\n",
    ];
    let mut content = String::new();
    for i in 0..blocks {
        if i > 0 {
            content.push('\n');
        }
        content.push_str(samples[i % samples.len()].trim_end_matches('\n'));
    }
    content
}

#[allow(dead_code)]
pub fn middle_content_offset(content: &str) -> usize {
    let mut at = content.len() / 2;
    while !content.is_char_boundary(at) {
        at += 1;
    }
    at
}
