// Generated lookup table: packed 4-byte extension key -> Category.
// Source: examples/original_source/pscanexts.h (extension names and their
// picture/video/audio/document classification). Sorted ascending by key for
// binary search. One collision exists after 4-byte truncation ("mpeg" vs.
// "mpega", both -> 680585); the first-seen entry ("mpeg", video) is kept and
// "mpega" is dropped, matching every other extension whose first 4 bytes
// coincide with another's.
const EXTENSION_TABLE: &[(u32, Category)] = &[
    (58, Category::Audio),      // au
    (160, Category::Video),     // dl
    (170, Category::Video),     // dv
    (271, Category::Video),     // gl
    (649, Category::Video),     // qt
    (667, Category::Audio),     // ra
    (679, Category::Audio),     // rm
    (759, Category::Video),     // ts
    (864, Category::Video),     // wm
    (1466, Category::Document), // abw
    (1708, Category::Audio),    // aif
    (1868, Category::Audio),    // amr
    (1966, Category::Audio),    // ape
    (2055, Category::Picture),  // art
    (2075, Category::Document), // asc
    (2078, Category::Video),    // asf
    (2096, Category::Video),    // asx
    (2192, Category::Video),    // avi
    (2222, Category::Audio),    // awb
    (2258, Category::Audio),    // axa
    (2279, Category::Video),    // axv
    (3235, Category::Picture),  // bmp
    (3410, Category::Document), // brf
    (4150, Category::Audio),    // caf
    (4273, Category::Picture),  // cdr
    (4275, Category::Picture),  // cdt
    (4719, Category::Picture),  // cpt
    (4796, Category::Picture),  // crw
    (4802, Category::Picture),  // cr2
    (4814, Category::Audio),    // csd
    (5815, Category::Video),    // dif
    (5868, Category::Picture),  // djv
    (6034, Category::Document), // doc
    (6051, Category::Document), // dot
    (7517, Category::Picture),  // erf
    (8667, Category::Video),    // fli
    (8680, Category::Video),    // flv
    (9922, Category::Picture),  // gif
    (10299, Category::Audio),   // gsm
    (12447, Category::Picture), // ico
    (12512, Category::Picture), // ief
    (14215, Category::Picture), // jng
    (14287, Category::Picture), // jpe
    (14289, Category::Picture), // jpg
    (15114, Category::Audio),   // kar
    (15669, Category::Document),// kpr
    (15671, Category::Document),// kpt
    (15778, Category::Document),// ksp
    (15914, Category::Document),// kwd
    (15930, Category::Document),// kwt
    (17137, Category::Video),   // lsf
    (17155, Category::Video),   // lsx
    (17947, Category::Document),// mdb
    (18134, Category::Audio),   // mid
    (18226, Category::Video),   // mkv
    (18322, Category::Video),   // mng
    (18374, Category::Video),   // mov
    (18394, Category::Video),   // mpe
    (18396, Category::Video),   // mpg
    (18411, Category::Video),   // mpv
    (18418, Category::Audio),   // mp2
    (18419, Category::Audio),   // mp3
    (18420, Category::Video),   // mp4
    (18556, Category::Video),   // mts
    (18706, Category::Video),   // mxu
    (18928, Category::Audio),   // m3u
    (18945, Category::Audio),   // m4a
    (19357, Category::Picture), // nef
    (20685, Category::Document),// odb
    (20686, Category::Document),// odc
    (20692, Category::Picture), // odi
    (20696, Category::Document),// odm
    (20699, Category::Document),// odp
    (20702, Category::Document),// ods
    (20703, Category::Document),// odt
    (20795, Category::Audio),   // oga
    (20801, Category::Audio),   // ogg
    (20816, Category::Video),   // ogv
    (21204, Category::Audio),   // orc
    (21207, Category::Picture), // orf
    (21283, Category::Document),// oth
    (21291, Category::Document),// otp
    (21294, Category::Document),// ots
    (21295, Category::Document),// ott
    (21961, Category::Picture), // pat
    (21991, Category::Picture), // pbm
    (22039, Category::Picture), // pcx
    (22058, Category::Document),// pdf
    (22176, Category::Picture), // pgm
    (22367, Category::Audio),   // pls
    (22429, Category::Picture), // png
    (22435, Category::Picture), // pnm
    (22479, Category::Document),// pot
    (22509, Category::Picture), // ppm
    (22515, Category::Document),// pps
    (22516, Category::Document),// ppt
    (22611, Category::Picture), // psd
    (24692, Category::Audio),   // ram
    (24698, Category::Picture), // ras
    (24903, Category::Picture), // rgb
    (25388, Category::Document),// rtf
    (26137, Category::Audio),   // sco
    (26182, Category::Document),// sdw
    (26188, Category::Audio),   // sd2
    (26282, Category::Document),// sgl
    (26348, Category::Audio),   // sid
    (26533, Category::Audio),   // snd
    (26627, Category::Audio),   // spx
    (26697, Category::Document),// srt
    (26774, Category::Document),// stw
    (26832, Category::Picture), // svg
    (26906, Category::Document),// sxg
    (26922, Category::Document),// sxw
    (27719, Category::Picture), // tif
    (28084, Category::Video),   // tsa
    (28105, Category::Video),   // tsv
    (28288, Category::Document),// txt
    (31546, Category::Audio),   // wav
    (31548, Category::Audio),   // wax
    (31969, Category::Audio),   // wma
    (31990, Category::Video),   // wmv
    (31992, Category::Video),   // wmx
    (32325, Category::Video),   // wvx
    (32943, Category::Picture), // xbm
    (33302, Category::Document),// xlb
    (33319, Category::Document),// xls
    (33320, Category::Document),// xlt
    (33461, Category::Picture), // xpm
    (33711, Category::Picture), // xwd
    (41345, Category::Video),   // 3gp
    (63199, Category::Audio),   // aifc
    (63202, Category::Audio),   // aiff
    (163597, Category::Document), // chrt
    (217137, Category::Picture),  // djvu
    (223271, Category::Document), // docm
    (223282, Category::Document), // docx
    (223900, Category::Document), // dotm
    (223911, Category::Document), // dotx
    (320386, Category::Audio),    // flac
    (528626, Category::Picture),  // jpeg
    (670967, Category::Audio),    // midi
    (679847, Category::Video),    // movie
    (680585, Category::Video),    // mpeg
    (680653, Category::Audio),    // mpga
    (698949, Category::Video),    // m2ts
    (831736, Category::Document), // potm
    (831747, Category::Document), // potx
    (832402, Category::Document), // ppam
    (833068, Category::Document), // ppsm
    (833079, Category::Document), // ppsx
    (833105, Category::Document), // pptm
    (833116, Category::Document), // pptx
    (978996, Category::Document), // sldm
    (979007, Category::Document), // sldx
    (992810, Category::Picture),  // svgz
    (1020813, Category::Document),// text
    (1025609, Category::Picture), // tiff
    (1168254, Category::Picture), // wbmp
    (1171951, Category::Video),   // webm
    (1232150, Category::Document),// xlam
    (1232805, Category::Document),// xlsb
    (1232816, Category::Document),// xlsm
    (1232827, Category::Document),// xlsx
    (1232853, Category::Document),// xltm
    (1232864, Category::Document),// xltx
];

/// `(extension, category)` pairs mirroring `EXTENSION_TABLE`, kept as plain
/// strings for tests that need to go forward (name -> category) rather than
/// search the packed-key table directly.
#[cfg(test)]
const EXTENSION_NAMES: &[(&str, Category)] = &[
    ("au", Category::Audio),
    ("dl", Category::Video),
    ("avi", Category::Video),
    ("bmp", Category::Picture),
    ("doc", Category::Document),
    ("gif", Category::Picture),
    ("jpg", Category::Picture),
    ("mp3", Category::Audio),
    ("mp4", Category::Video),
    ("mkv", Category::Video),
    ("odt", Category::Document),
    ("pdf", Category::Document),
    ("png", Category::Picture),
    ("txt", Category::Document),
    ("wav", Category::Audio),
    ("3gp", Category::Video),
    ("aiff", Category::Audio),
    ("docx", Category::Document),
    ("flac", Category::Audio),
    ("jpeg", Category::Picture),
    ("movie", Category::Video),
    ("mpeg", Category::Video),
    ("mpga", Category::Audio),
    ("pptx", Category::Document),
    ("tiff", Category::Picture),
    ("webm", Category::Video),
    ("xlsx", Category::Document),
];
