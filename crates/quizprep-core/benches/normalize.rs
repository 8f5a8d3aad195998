use criterion::{black_box, criterion_group, criterion_main, Criterion};

use quizprep_core::normalize::{clean_markup, normalize, RawResponse};

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    let numbered = r#"Here are your questions:

1. **Explain** the role of the <strong>mitochondria</strong> in cellular respiration.
2. Compare <em>mitosis</em> and meiosis.
3. Why does the cell membrane need to be <span class="code">selectively</span> permeable?
4. Describe the stages of photosynthesis.
5. How do enzymes lower activation energy?
"#;

    let unmarked = "Explain the role of the mitochondria.\n\n\
                    Compare mitosis and meiosis.\n\n\
                    Describe the stages of photosynthesis.";

    let json = r#"```json
{"questions": ["What is ATP?", "Why do cells divide?", "What is osmosis?"]}
```"#;

    let large = {
        let mut s = String::new();
        for i in 0..200 {
            s.push_str(&format!("{i}. <b>Question</b> number {i} about <i>topic {i}</i>?\n"));
        }
        s
    };

    group.bench_function("numbered", |b| {
        b.iter(|| normalize(black_box(numbered), 5))
    });

    group.bench_function("blank_line_fallback", |b| {
        b.iter(|| normalize(black_box(unmarked), 3))
    });

    group.bench_function("fenced_json", |b| {
        b.iter(|| normalize(RawResponse::from_content(black_box(json)), 3))
    });

    group.bench_function("200_lines", |b| {
        b.iter(|| normalize(black_box(large.as_str()), 10))
    });

    group.finish();
}

fn bench_clean_markup(c: &mut Criterion) {
    let mut group = c.benchmark_group("clean_markup");

    let nested = "<p><strong>Paris</strong> is the <em>capital</em> of <span class=\"tag\">France</span>.</p>";
    let plain = "What is the capital of France?";

    group.bench_function("nested_tags", |b| b.iter(|| clean_markup(black_box(nested))));
    group.bench_function("plain", |b| b.iter(|| clean_markup(black_box(plain))));

    group.finish();
}

criterion_group!(benches, bench_normalize, bench_clean_markup);
criterion_main!(benches);
