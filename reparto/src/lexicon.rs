//! Spanish closed vocabularies.
//!
//! Every list is lower-case; look words up with [`contains`].

// =============================================================================
// Closed vocabularies
// =============================================================================

/// Function words and bare honorifics: never an entity on their own.
pub const STOP_TITLES: &[&str] = &[
    "al", "aquel", "aquello", "aunque", "como", "con", "cual", "cuando", "cuyo", "de", "del",
    "desde", "don", "donde", "doña", "dr", "dra", "durante", "el", "ella", "ellas", "ellos", "en",
    "entre", "ese", "eso", "este", "esto", "hacia", "hasta", "la", "las", "le", "les", "lo",
    "los", "me", "mediante", "mi", "mis", "ni", "nos", "nosotras", "nosotros", "nuestra",
    "nuestro", "o", "os", "para", "pero", "por", "porque", "que", "quien", "se", "según", "señor",
    "señora", "si", "sin", "sino", "sobre", "sr", "sra", "su", "sus", "te", "tu", "tus", "tú",
    "un", "una", "unas", "unos", "usted", "ustedes", "vosotras", "vosotros", "vuestra", "vuestro",
    "y", "yo", "él",
];

/// Words that look like names when capitalized but never are. Only applied
/// to heuristic gazetteer candidates, not tagger spans.
pub const HEURISTIC_FALSE_POSITIVES: &[&str] = &[
    "abril", "acto", "acá", "adrenalina", "agosto", "ah", "ahora", "algo", "alguien", "allá",
    "allí", "alto", "anoche", "antes", "antiguo", "aquí", "ay", "ayer", "azul", "bah", "bajo",
    "bello", "bien", "blanco", "cabello", "cada", "capítulo", "cara", "como", "cualquier",
    "cualquiera", "cuando", "cuanto", "cuándo", "cuánto", "cómo", "demo", "después", "diciembre",
    "domingo", "donde", "dopamina", "dónde", "eh", "ejemplo", "endorfina", "endorfinas", "enero",
    "entonces", "epílogo", "escena", "extraño", "febrero", "feo", "fin", "final", "flaco",
    "fresh", "gordo", "grande", "hermoso", "hormona", "hormonas", "horrible", "hoy", "imposible",
    "increíble", "inicio", "invierno", "ja", "joven", "jueves", "julio", "junio", "libro",
    "luego", "lunes", "madrugada", "mal", "manos", "martes", "marzo", "mayo", "mañana",
    "mediodía", "misma", "mismas", "mismo", "mismos", "miércoles", "moreno", "nada", "nadie",
    "negro", "neurotransmisor", "neurotransmisores", "no", "noche", "noviembre", "nuevo", "nunca",
    "octubre", "oh", "ojos", "otoño", "otra", "otras", "otro", "otros", "parte", "pelo",
    "pequeño", "piel", "primavera", "principio", "prueba", "prólogo", "que", "quien", "quizá",
    "quizás", "quién", "qué", "raro", "rojo", "rostro", "rubio", "septiembre", "serotonina",
    "siempre", "sábado", "sí", "tarde", "terrible", "test", "todo", "todos", "uf", "verano",
    "verde", "viejo", "viernes", "volumen",
];

/// Greetings, connectors and descriptive phrases the tagger likes to label.
pub const COMMON_PHRASES: &[&str] = &[
    "a veces", "adiós", "adrenalina", "al parecer", "buen día", "buenas noches", "buenas tardes",
    "buenos días", "cabello castaño", "cabello negro", "cabello rubio", "capítulo", "como estas",
    "cómo estás", "de hecho", "de nada", "de vez en cuando", "donde esta", "donde estas",
    "dopamina", "dónde está", "dónde estás", "el encuentro", "el final", "el principio",
    "en cambio", "en realidad", "endorfina", "endorfinas", "epílogo",
    "esos ojos verdes que tanto le gustaban", "extrañaba su pelo negro natural",
    "feliz cumpleaños", "fresh test do", "hasta luego", "hasta pronto", "hola", "hola juan",
    "imposible", "la adrenalina", "la contradicción", "la dopamina", "la endorfina",
    "la serotonina", "las endorfinas", "lo siento", "me gusta tu perfume", "mi cabello",
    "mi pelo", "mis manos", "mis ojos", "muchas gracias", "no obstante", "ojos azules",
    "ojos marrones", "ojos negros", "ojos verdes", "para que", "para qué", "parte", "pelo negro",
    "por cierto", "por favor", "por qué", "por supuesto", "porque", "prólogo", "que eres",
    "que es", "que tal", "quien eres", "quien es", "quizás", "quién eres", "quién es", "qué eres",
    "qué es", "qué tal", "serotonina", "sin embargo", "su cabello", "su cara", "su mirada",
    "su pelo", "su rostro", "sus ojos", "sus ojos azules", "sus ojos negros", "sus ojos verdes",
    "tal vez", "tengo", "tu cabello", "tu pelo", "tu rostro", "tus ojos",
];

/// Single words the statistical tagger is known to mislabel.
pub const TAGGER_FALSE_POSITIVES: &[&str] = &[
    "cabello", "extraño", "fresh", "hola", "horrible", "imposible", "increíble", "moreno",
    "negro", "ojos", "pelo", "rubio", "terrible", "test",
];

/// Kinship terms; not proper names when alone.
pub const FAMILY_TERMS: &[&str] = &[
    "abuela", "abuelas", "abuelo", "abuelos", "esposa", "esposo", "hermana", "hermanas",
    "hermano", "hermanos", "hija", "hijas", "hijo", "hijos", "madre", "madres", "marido", "mujer",
    "nieta", "nietas", "nieto", "nietos", "novia", "novias", "novio", "novios", "padre", "padres",
    "prima", "primas", "primo", "primos", "sobrina", "sobrinas", "sobrino", "sobrinos", "tia",
    "tio", "tía", "tías", "tío", "tíos",
];

/// Personal and demonstrative pronouns, with and without the old accent.
pub const PRONOUNS: &[&str] = &[
    "aquel", "aquella", "aquellas", "aquellos", "aquél", "aquélla", "aquéllas", "aquéllos",
    "consigo", "ella", "ellas", "ellos", "esa", "esas", "ese", "esos", "esta", "estas", "este",
    "estos", "la", "las", "le", "les", "lo", "los", "me", "nos", "nosotras", "nosotros", "os",
    "se", "sí", "te", "tú", "usted", "ustedes", "vosotras", "vosotros", "yo", "él", "ésa", "ésas",
    "ése", "ésos", "ésta", "éstas", "éste", "éstos",
];

/// Conjugated verbs that show up capitalized at sentence start.
pub const VERBS_AT_SENTENCE_START: &[&str] = &[
    "abrazo", "abrazó", "abrio", "abrió", "aprendio", "aprendió", "añadió", "bajo", "bajó",
    "beso", "besó", "camino", "caminó", "caso", "casó", "cayo", "cayó", "cerro", "cerró", "colgo",
    "colgó", "comentó", "compro", "compró", "conocio", "conoció", "consiguió", "contactarian",
    "contactarían", "contacto", "contactó", "contestó", "continuó", "corrio", "corrió", "creia",
    "creía", "deberia", "debería", "debes", "debia", "debía", "decia", "decidió", "decía",
    "desperto", "despertó", "dices", "diga", "dijo", "dio", "diria", "diría", "elaboraron",
    "empezó", "encontró", "entró", "era", "escribio", "escribió", "escucho", "escuchó", "espero",
    "esperó", "estaba", "exclamó", "explicó", "fue", "graduo", "graduó", "gritó", "habia",
    "había", "haces", "hacia", "hacía", "haga", "haria", "haría", "hizo", "iba", "intentó",
    "iria", "iría", "levanto", "levantó", "leyo", "leyó", "llegó", "logró", "marco", "marcó",
    "miro", "miró", "mudo", "mudó", "murio", "murió", "murmuró", "nacio", "nació", "notó",
    "olvidó", "oyó", "pasó", "penso", "pensó", "podia", "podria", "podría", "podía", "ponga",
    "preguntó", "preparo", "preparó", "pudo", "puedes", "queria", "quería", "quieres", "recibio",
    "recibió", "recordó", "respondió", "reviso", "revisó", "sabes", "sabia", "sabía", "salga",
    "salió", "saludo", "saludó", "sentaron", "seria", "sería", "sigues", "siguió", "sintió",
    "sono", "sonó", "supo", "suspiro", "suspiró", "susurró", "tendria", "tendría", "tengo",
    "tenia", "tenía", "terminó", "tienes", "tomo", "tomó", "trabajo", "trabajó", "traiga",
    "trajo", "traía", "tuvo", "usaria", "usaría", "vas", "venga", "ves", "vienes", "vino", "vio",
    "vivia", "vivio", "vivió", "vivía", "volveria", "volvería",
];

/// Common nouns and adjectives that appear capitalized in headings and notes.
pub const COMMON_WORDS_CAPITALIZED: &[&str] = &[
    "adolescencia", "adulta", "adulto", "ahora", "alguien", "anacoluto", "antes", "aroma",
    "barba", "bastante", "bastantes", "bebida", "boda", "bodas", "cabello", "carta", "cartas",
    "causas", "circunstancias", "comienzo", "comienzos", "concordancia", "conflictos",
    "consecuencias", "correcto", "cronologico", "cronológico", "cualquiera", "cuarta", "cuarto",
    "decisiones", "decisión", "demasiada", "demasiadas", "demasiado", "demasiados", "dequeísmo",
    "despertar", "despues", "después", "dificiles", "difíciles", "edad", "efectos", "ejemplo",
    "encuentro", "encuentros", "error", "esperada", "estatura", "estructura", "eventos",
    "explicaciones", "explicación", "faciles", "feliz", "final", "formato", "formatos", "fáciles",
    "graduacion", "graduación", "gramática", "habemos", "haiga", "hubieron", "importante",
    "importantes", "incluidas", "incluidos", "inconsistencias", "incorrecto", "infancia",
    "inicio", "intencionadas", "intencionados", "jueves", "laísmo", "leísmo", "loísmo", "luego",
    "martes", "mayor", "mejor", "menor", "menos", "miércoles", "motivos", "muerte", "muertes",
    "más", "nacimiento", "nacimientos", "nadie", "nota", "notas", "observación", "ojos",
    "origenes", "orígenes", "pelo", "peor", "perfume", "personaje", "plan", "planes", "pleonasmo",
    "postre", "primera", "primero", "problemas", "profesion", "profesión", "pronto", "queísmo",
    "quienquiera", "quinta", "quinto", "razones", "redundancia", "redundancias", "resoluciones",
    "resumen", "revelaciones", "revelación", "secretos", "segunda", "segundo", "sintaxis",
    "situaciones", "solecismo", "suficiente", "suficientes", "tarde", "temporales", "temprano",
    "tercera", "tercero", "trabajo", "trabajos", "universidad", "urgente", "urgentes", "verdad",
    "verdades", "viaje", "viajes", "viernes",
];

/// First words that mark a span as a clause rather than a name.
pub const SENTENCE_STARTERS: &[&str] = &[
    "algo", "decía", "dice", "era", "es", "estaba", "está", "fue", "había", "hace", "hacía",
    "iba", "parece", "parecía", "tenía", "tiene", "va", "venía", "viene",
];

pub const ARTICLES: &[&str] = &[
    "el", "la", "los", "las", "un", "una", "unos", "unas",
];

/// Nouns that make `<article> <noun>` a generic description.
pub const GENERIC_NOUNS: &[&str] = &[
    "abogados", "aeropuerto", "aire", "alma", "amor", "anterior", "autobus", "autobús", "avion",
    "avión", "bar", "boca", "brazo", "brazos", "cabeza", "cafe", "café", "calle", "cama",
    "camino", "cara", "carta", "casa", "cerebro", "cielo", "ciudad", "coche", "cocina", "copa",
    "corazon", "corazón", "cosa", "cuello", "cuerpo", "decision", "decisión", "dedo", "dedos",
    "diente", "dientes", "doctores", "día", "escuela", "esofago", "espalda", "estacion",
    "estación", "estomago", "estudiantes", "estómago", "esófago", "forma", "frente", "garganta",
    "gente", "habitación", "higado", "historia", "hombre", "hombro", "hombros", "hospital",
    "hígado", "idea", "jueces", "labio", "labios", "laringe", "lengua", "libro", "llave", "lugar",
    "luna", "luz", "madre", "manera", "mano", "manos", "mar", "medicos", "mensaje", "mente",
    "mesa", "misma", "mismo", "momento", "muela", "muerte", "mujer", "mundo", "médicos", "nariz",
    "noche", "oficina", "ojo", "ojos", "oreja", "orejas", "otra", "otro", "padre", "paladar",
    "pared", "país", "pecho", "persona", "pie", "pierna", "piernas", "pies", "plan", "plato",
    "policias", "policías", "problema", "profesores", "puerta", "pulmon", "pulmón", "relación",
    "reloj", "restaurante", "riñon", "riñón", "rodilla", "siguiente", "silla", "sobre", "sol",
    "soldados", "solucion", "solución", "telefono", "teléfono", "tiempo", "tienda", "tierra",
    "tobillo", "tren", "vaso", "ventana", "verdad", "vez", "viaje", "vida", "viento", "vientre",
];

/// Verbs (and numerals) that follow an article in mis-segmented clauses.
pub const VERBS_AFTER_ARTICLE: &[&str] = &[
    "debe", "debía", "dos", "era", "es", "estaba", "está", "fue", "había", "hace", "hacía", "iba",
    "podía", "puede", "quería", "quiere", "sabe", "sabía", "tenía", "tiene", "tres", "va",
    "venía", "viene",
];

pub const REFLEXIVE_PRONOUNS: &[&str] = &[
    "me", "nos", "os", "se", "te",
];

/// Words that, after the first, reveal a clause in spans of three or more words.
pub const VERB_INDICATORS: &[&str] = &[
    "a", "acerco", "acercó", "con", "de", "dijo", "entró", "era", "estaba", "fue", "la", "las",
    "le", "les", "llegó", "lo", "los", "me", "miró", "nos", "os", "para", "por", "preguntó",
    "respondió", "salió", "saludo", "saludó", "se", "sin", "te", "vio",
];

pub const GREETINGS: &[&str] = &[
    "hola", "adiós", "buenos", "buenas",
];

pub const INTERROGATIVE_STARTERS: &[&str] = &[
    "como", "cuando", "cuanto", "cuándo", "cuánto", "cómo", "donde", "dónde", "para qué",
    "por qué", "que", "quien", "quién", "qué",
];

pub const SCIENTIFIC_TERMS: &[&str] = &[
    "adrenalina", "dopamina", "endorfina", "endorfinas", "hormona", "hormonas", "neurotransmisor",
    "neurotransmisores", "serotonina",
];

pub const POSSESSIVES: &[&str] = &[
    "mi", "mis", "nuestra", "nuestro", "su", "sus", "tu", "tus",
];

/// Nouns that keep a possessive-initial span alive ("Su Majestad").
pub const FORMAL_TITLES: &[&str] = &[
    "alteza", "eminencia", "excelencia", "majestad", "santidad", "señoría",
];


// =============================================================================
// Morphology
// =============================================================================

/// Conjugation endings checked on single long words.
pub const VERB_ENDINGS: &[&str] = &[
    "aban", "ían", "eron", "aron", "ieron", "aba", "ía", "ió", "ó", "arás", "erás", "irás", "ará",
    "erá", "irá", "arán", "erán", "irán", "aremos", "eremos", "iremos", "aría", "ería", "iría",
    "arían", "erían", "irían", "aríamos", "eríamos", "iríamos", "ases", "ieses", "ase", "iese",
    "ásemos", "iésemos", "ara", "iera", "aras", "ieras", "áramos", "iéramos", "are", "iere",
    "aren", "ieren", "ando", "iendo", "endo", "ar", "er", "ir", "amos", "emos", "imos",
];

/// Endings no Spanish proper name carries.
pub const DEFINITE_VERB_ENDINGS: &[&str] = &[
    "arás", "erás", "irás", "aría", "ería", "iría", "arían", "erían", "irían", "aban", "aron",
    "ieron", "ían", "ases", "ieses", "áramos", "iéramos", "amos", "emos", "imos",
];

pub const ENCLITICS: &[&str] = &[
    "me", "te", "se", "lo", "la", "los", "las", "le", "les", "nos", "os",
];

pub const DOUBLE_ENCLITICS: &[&str] = &[
    "melo", "mela", "melos", "melas", "telo", "tela", "telos", "telas", "selo", "sela", "selos",
    "selas", "noslo", "nosla", "noslos", "noslas",
];

pub const ACCENTED_VOWELS: &[&str] = &[
    "á", "é", "í", "ó", "ú",
];

pub const PRETERITE_ENDINGS: &[&str] = &[
    "ó", "ió", "aron", "ieron", "aste", "iste",
];

pub const IMPERATIVE_ENDINGS: &[&str] = &[
    "ate", "ete", "ite",
];

pub const FUNCTION_WORDS: &[&str] = &[
    "a", "al", "con", "de", "del", "el", "en", "la", "las", "los", "para", "por", "un", "una",
];

pub const QUANTIFIERS: &[&str] = &[
    "mucha", "mucho", "poca", "poco", "tanta", "tantas", "tanto", "tantos",
];

pub const CARDINAL_DIRECTIONS: &[&str] = &[
    "este", "noreste", "noroeste", "norte", "oeste", "sur", "sureste", "suroeste",
];

pub const MONTHS: &[&str] = &[
    "abril", "agosto", "diciembre", "enero", "febrero", "julio", "junio", "marzo", "mayo",
    "noviembre", "octubre", "septiembre",
];

/// Common nouns the tagger labels ORG.
pub const ORG_TECHNICAL_TERMS: &[&str] = &[
    "escotilla", "escotillón", "iglesia", "prensa",
];

/// Adjectives the tagger labels PER.
pub const COMMON_ADJECTIVES: &[&str] = &[
    "hermosa", "hermosas", "hermoso", "hermosos", "influida", "influidas", "influido",
    "influidos", "natural", "naturales", "naturalismo", "picaresca", "picaresco",
];

/// Common nouns the tagger labels LOC.
pub const NATURE_NOUNS: &[&str] = &[
    "bosque", "campo", "casino", "catedral", "cielo", "hierba", "iglesia", "jardín", "luna",
    "mar", "obispo", "río", "sol", "tierra", "yerba",
];

/// Fixed expressions the tagger labels MISC.
pub const COMMON_EXPRESSIONS: &[&str] = &[
    "el nuestro", "en efecto", "la nuestra", "lo nuestro", "por mi parte", "por su parte",
    "sin duda", "tanta", "tantas", "tanto", "tantos",
];

/// Forms the tagger misses as verbs (gerunds, voseo).
pub const VERB_OVERRIDES: &[&str] = &[
    "habiendo", "hablás", "podés", "querés", "sabiendo", "sabés", "salís", "siendo", "teniendo",
    "tenés", "venís",
];

/// Given names the tagger mistakes for verbs or common nouns.
pub const NOT_VERB_OVERRIDES: &[&str] = &[
    "alba", "amparo", "aurora", "consuelo", "cruz", "dolores", "esperanza", "iris", "mar",
    "mercedes", "pilar", "rosa", "sol",
];

/// Words that, right before a surname, make it a place or business.
pub const LOCATION_CONTEXT: &[&str] = &[
    "avenida", "bar", "barrio", "calle", "camino", "carretera", "distrito", "hotel", "las", "los",
    "paseo", "plaza", "pueblo", "restaurante", "taberna", "tienda", "vía", "zona",
];

pub const LOCATION_PREPOSITIONS: &[&str] = &[
    "desde", "en", "hacia", "hasta", "por",
];


// =============================================================================
// Validator
// =============================================================================

/// Multi-word connectors that are never entities.
pub const DISCOURSE_MARKERS: &[&str] = &[
    "a continuación", "acto seguido", "al cabo de", "al día siguiente", "al instante", "así pues",
    "de hecho", "de nuevo", "de repente", "de todas formas", "de todos modos", "en consecuencia",
    "en cualquier caso", "en efecto", "en ese momento", "en todo caso", "inmediatamente después",
    "justo después", "mientras tanto", "más adelante", "más tarde", "no obstante", "nuevamente",
    "otra vez", "poco antes", "poco después", "por cierto", "por consiguiente", "por lo tanto",
    "sea como sea", "seguidamente", "sin embargo", "una vez más",
];

/// High-frequency words used by the common-word sub-score.
pub const COMMON_SPANISH_WORDS: &[&str] = &[
    "a", "abajo", "acaso", "acá", "ahora", "ahí", "algo", "allá", "allí", "alto", "ancho", "ante",
    "anterior", "antes", "apenas", "aquel", "aquella", "aquellas", "aquellos", "aquí", "arriba",
    "aunque", "año", "años", "bajo", "bien", "bueno", "cerca", "clase", "como", "con", "conmigo",
    "consigo", "contigo", "contra", "correcto", "corto", "cosa", "cosas", "cuando", "cuál",
    "cuáles", "cuándo", "cuánta", "cuántas", "cuánto", "cuántos", "cómo", "de", "debajo", "debe",
    "deber", "debió", "debía", "delante", "demás", "dentro", "desde", "después", "detrás",
    "donde", "día", "días", "dónde", "e", "el", "ella", "ellas", "ellos", "en", "encima",
    "entonces", "entre", "era", "es", "esa", "esas", "ese", "esos", "especie", "esta", "estaba",
    "estar", "estas", "este", "estos", "estrecho", "estuvo", "está", "forma", "fue", "fuera",
    "gente", "grande", "habemos", "haber", "había", "hace", "hacer", "hacia", "hacía", "haiga",
    "hasta", "hay", "hizo", "hombre", "hubieron", "hubo", "iba", "incorrecto", "ir", "joven",
    "la", "largo", "las", "le", "lejos", "les", "lo", "los", "luego", "lugar", "mal", "malo",
    "manera", "mayor", "me", "mejor", "menor", "menos", "mi", "mientras", "mis", "mismo", "modo",
    "momento", "mucho", "mujer", "mundo", "muy", "más", "mí", "nada", "ni", "no", "noche",
    "noches", "nos", "nosotros", "nuestra", "nuestras", "nuestro", "nuestros", "nuevo", "nunca",
    "o", "os", "otro", "para", "parte", "peor", "pequeño", "pero", "persona", "poco", "poder",
    "podía", "por", "por qué", "porque", "primero", "pudo", "puede", "pues", "que", "quizá",
    "quizás", "quién", "quiénes", "qué", "se", "según", "ser", "si", "siempre", "siguiente",
    "sin", "sino", "sobre", "su", "sus", "sí", "tal vez", "también", "tampoco", "tan", "tanto",
    "te", "tener", "tenía", "ti", "tiempo", "tiene", "tipo", "todavía", "todo", "tras", "tu",
    "tus", "tuvo", "tú", "u", "un", "una", "unas", "unos", "va", "veces", "vez", "vida", "viejo",
    "vosotros", "vuestra", "vuestras", "vuestro", "vuestros", "y", "ya", "yo", "él", "último",
];

/// Endings used by the morphology sub-score when no annotation is available.
pub const VALIDATOR_VERB_ENDINGS: &[&str] = &[
    "a", "aba", "abais", "aban", "abas", "amos", "an", "ara", "arais", "aran", "aras", "aremos",
    "aron", "ará", "arán", "arás", "aré", "aréis", "aría", "aríais", "aríamos", "arían", "arías",
    "as", "ase", "aseis", "asen", "ases", "aste", "asteis", "e", "emos", "en", "eremos", "erá",
    "erán", "erás", "eré", "eréis", "ería", "eríais", "eríamos", "erían", "erías", "es", "iera",
    "ierais", "ieran", "ieras", "ieron", "iese", "ieseis", "iesen", "ieses", "imos", "iremos",
    "irá", "irán", "irás", "iré", "iréis", "iría", "iríais", "iríamos", "irían", "irías", "iste",
    "isteis", "iéramos", "iésemos", "ió", "o", "ábamos", "áis", "áramos", "ásemos", "é", "éis",
    "í", "ía", "íais", "íamos", "ían", "ías", "ís", "ó",
];


// =============================================================================
// Patterns
// =============================================================================

/// Professional, religious, military and noble titles.
pub const PROFESSIONAL_TITLES: &[&str] = &[
    "almirante", "baron", "baronesa", "barón", "capitan", "capitán", "catedratica", "catedratico",
    "catedrático", "comandante", "comisaria", "comisario", "conde", "condesa", "coronel",
    "doctor", "doctora", "dr", "dra", "duque", "duquesa", "fiscal", "fray", "general", "hermana",
    "hermano", "iman", "imán", "inspector", "inspectora", "juez", "jueza", "madre", "marques",
    "marquesa", "marqués", "mayor", "padre", "princesa", "principe", "profesor", "profesora",
    "príncipe", "rabina", "rabino", "reina", "rey", "sargento", "sor", "subinspector",
    "subinspectora", "sultan", "sultana", "sultán", "teniente",
];

/// Geographic and institutional prefixes.
pub const LOCATION_PREFIXES: &[&str] = &[
    "aeropuerto", "avenida", "bahia", "bahía", "barrio", "base", "bosque", "cabo", "calle",
    "campamento", "campo", "canon", "castillo", "catedral", "cañón", "colegio", "colonia",
    "convento", "cordillera", "departamento", "desfiladero", "desierto", "estacion", "estación",
    "fortaleza", "hospital", "iglesia", "imperio", "instituto", "isla", "lago", "laguna",
    "llanura", "mar", "monasterio", "monte", "muralla", "oceano", "océano", "palacio", "parque",
    "paseo", "peninsula", "península", "plaza", "pradera", "provincia", "puerto", "region",
    "región", "reino", "republica", "república", "rio", "río", "selva", "sierra", "torre",
    "universidad", "urbanizacion", "urbanización", "valle", "volcan", "volcán",
];

/// Frequent surnames, with and without accents.
pub const COMMON_SURNAMES: &[&str] = &[
    "alvarez", "blanco", "campos", "castillo", "castro", "cruz", "delgado", "diaz", "dominguez",
    "domínguez", "díaz", "fernandez", "fernández", "flores", "fuente", "garcia", "garcía",
    "gonzalez", "gonzález", "guerrero", "hernandez", "hernández", "herrera", "jimenez", "jiménez",
    "leon", "lopez", "lópez", "marin", "martinez", "martínez", "marín", "medina", "molina",
    "moreno", "muñoz", "navarro", "ortega", "ortiz", "perez", "pérez", "ramos", "reyes",
    "rodriguez", "rodríguez", "romero", "ruiz", "sanchez", "serrano", "sánchez", "torres",
    "vazquez", "vega", "vázquez", "álvarez",
];


// =============================================================================
// Post-processing
// =============================================================================

pub const LITERARY_PSEUDONYMS: &[&str] = &[
    "azorín", "benito el garbancero", "clarín", "el caballero", "el cid", "el greco",
    "el magistral", "fernán caballero", "la dama", "la regenta", "tirso de molina",
];

pub const FICTIONAL_PLACES: &[&str] = &[
    "castroforte", "ficóbriga", "macondo", "marineda", "orbajosa", "pilares", "vetusta",
    "villabajo",
];

/// Words the tagger labels MISC that are never entities.
pub const MISC_ERRORS: &[&str] = &[
    "bien", "diccionario", "dios", "el", "la", "las", "levantate", "levántate", "los", "mal",
    "menos", "más", "naturaleza", "sientate", "siéntate", "tanta", "tanto", "ven", "vete", "y al",
];

/// Surnames that, alone and labelled MISC, are a character.
pub const COMMON_SURNAMES_AS_PER: &[&str] = &[
    "díaz", "fernández", "garcía", "gonzález", "hernández", "lópez", "martínez", "moreno",
    "muñoz", "navarro", "ozores", "pérez", "rodríguez", "romero", "sánchez",
];


/// Exact membership test.
#[must_use]
pub fn contains(list: &[&str], word: &str) -> bool {
    list.iter().any(|w| *w == word)
}

/// True if `word` ends with any of `endings`.
#[must_use]
pub fn ends_with_any(word: &str, endings: &[&str]) -> bool {
    endings.iter().any(|e| word.ends_with(e))
}

/// The first of `endings` that `word` ends with.
#[must_use]
pub fn matching_ending<'a>(word: &str, endings: &[&'a str]) -> Option<&'a str> {
    endings.iter().copied().find(|e| word.ends_with(e))
}
