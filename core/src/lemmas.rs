use std::collections::HashMap;

// Irregular inflections whose base form cannot be reached by suffix stripping.
const IRREGULAR: &[(&str, &str)] = &[
    ("analyses", "analysis"),
    ("appendices", "appendix"),
    ("automata", "automaton"),
    ("axes", "axis"),
    ("bases", "basis"),
    ("children", "child"),
    ("corpora", "corpus"),
    ("criteria", "criterion"),
    ("curricula", "curriculum"),
    ("feet", "foot"),
    ("foci", "focus"),
    ("formulae", "formula"),
    ("geese", "goose"),
    ("hypotheses", "hypothesis"),
    ("indices", "index"),
    ("lemmata", "lemma"),
    ("loci", "locus"),
    ("matrices", "matrix"),
    ("maxima", "maximum"),
    ("media", "medium"),
    ("men", "man"),
    ("mice", "mouse"),
    ("minima", "minimum"),
    ("nuclei", "nucleus"),
    ("optima", "optimum"),
    ("phenomena", "phenomenon"),
    ("quanta", "quantum"),
    ("radii", "radius"),
    ("schemata", "schema"),
    ("simplices", "simplex"),
    ("spectra", "spectrum"),
    ("stimuli", "stimulus"),
    ("strata", "stratum"),
    ("syntheses", "synthesis"),
    ("teeth", "tooth"),
    ("theses", "thesis"),
    ("vertices", "vertex"),
    ("women", "woman"),
];

pub fn builtin_lemmas() -> HashMap<String, String> {
    IRREGULAR.iter().map(|(form, lemma)| (form.to_string(), lemma.to_string())).collect()
}
