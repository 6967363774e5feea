use criterion::{black_box, criterion_group, criterion_main, Criterion};
use phenodata::{decode, observations_from_frame, DecodeOptions};

const HEADER: &str =
    "Stations_id;Referenzjahr;Qualitaetsniveau;Objekt_id;Phase_id;Eintrittsdatum;Eintrittsdatum_QB;Jultag;eor;\r\n";

fn observation_file(rows: usize) -> Vec<u8> {
    let mut payload = String::from(HEADER);
    for row in 0..rows {
        let day = 1 + row % 365;
        payload.push_str(&format!(
            "{:>7};2021;    7;113;  5;2021{:04};1;{:>4};eor;\r\n",
            10_000 + row,
            101 + row % 28,
            day
        ));
    }
    payload.into_bytes()
}

fn bench_decoder(c: &mut Criterion) {
    let payload = observation_file(10_000);
    let resource = "PH_Sofortmelder_Wildwachsende_Pflanze_Hasel_akt.txt";
    c.bench_function("decode_integers", |b| {
        b.iter(|| decode(black_box(&payload), resource, DecodeOptions::integers()))
    });
    c.bench_function("decode_observations", |b| {
        b.iter(|| {
            decode(black_box(&payload), resource, DecodeOptions::integers())
                .ok()
                .flatten()
                .map(|frame| observations_from_frame(&frame, resource))
        })
    });
}

criterion_group!(benches, bench_decoder);
criterion_main!(benches);
