//! The 88 IAU constellations, with the approximate J2000 center used to frame them.

use itertools::Itertools;

use crate::constants::RADH;
use crate::ref_system::SkyPosition;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constellation {
    pub abbreviation: &'static str,
    pub name: &'static str,
    pub ra_hours: f64,
    pub dec_deg: f64,
}

impl Constellation {
    /// Equatorial J2000 center.
    pub fn center(&self) -> SkyPosition {
        SkyPosition::new(self.ra_hours * RADH, self.dec_deg.to_radians())
    }
}

const fn c(abbreviation: &'static str, name: &'static str, ra_hours: f64, dec_deg: f64) -> Constellation {
    Constellation {
        abbreviation,
        name,
        ra_hours,
        dec_deg,
    }
}

pub const CONSTELLATIONS: [Constellation; 88] = [
    c("And", "Andromeda", 0.81, 37.4),
    c("Ant", "Antlia", 10.27, -32.5),
    c("Aps", "Apus", 16.14, -75.3),
    c("Aqr", "Aquarius", 22.29, -10.8),
    c("Aql", "Aquila", 19.67, 3.4),
    c("Ara", "Ara", 17.37, -56.6),
    c("Ari", "Aries", 2.64, 20.8),
    c("Aur", "Auriga", 6.07, 42.0),
    c("Boo", "Bootes", 14.71, 31.2),
    c("Cae", "Caelum", 4.70, -37.9),
    c("Cam", "Camelopardalis", 8.86, 69.4),
    c("Cnc", "Cancer", 8.65, 19.8),
    c("CVn", "Canes Venatici", 13.12, 40.1),
    c("CMa", "Canis Major", 6.83, -22.1),
    c("CMi", "Canis Minor", 7.65, 6.4),
    c("Cap", "Capricornus", 21.05, -18.0),
    c("Car", "Carina", 8.70, -63.2),
    c("Cas", "Cassiopeia", 1.32, 62.2),
    c("Cen", "Centaurus", 13.07, -47.3),
    c("Cep", "Cepheus", 22.00, 71.0),
    c("Cet", "Cetus", 1.67, -7.2),
    c("Cha", "Chamaeleon", 10.69, -79.2),
    c("Cir", "Circinus", 14.57, -63.0),
    c("Col", "Columba", 5.86, -35.1),
    c("Com", "Coma Berenices", 12.79, 23.3),
    c("CrA", "Corona Australis", 18.65, -41.1),
    c("CrB", "Corona Borealis", 15.84, 32.6),
    c("Crv", "Corvus", 12.44, -18.4),
    c("Crt", "Crater", 11.39, -15.9),
    c("Cru", "Crux", 12.45, -60.2),
    c("Cyg", "Cygnus", 20.59, 44.5),
    c("Del", "Delphinus", 20.69, 11.7),
    c("Dor", "Dorado", 5.24, -59.4),
    c("Dra", "Draco", 15.14, 67.0),
    c("Equ", "Equuleus", 21.19, 7.8),
    c("Eri", "Eridanus", 3.30, -28.8),
    c("For", "Fornax", 2.80, -31.6),
    c("Gem", "Gemini", 7.07, 22.6),
    c("Gru", "Grus", 22.46, -46.4),
    c("Her", "Hercules", 17.39, 27.5),
    c("Hor", "Horologium", 3.28, -53.3),
    c("Hya", "Hydra", 11.61, -14.5),
    c("Hyi", "Hydrus", 2.34, -69.9),
    c("Ind", "Indus", 21.97, -59.7),
    c("Lac", "Lacerta", 22.46, 46.0),
    c("Leo", "Leo", 10.67, 13.1),
    c("LMi", "Leo Minor", 10.25, 32.1),
    c("Lep", "Lepus", 5.57, -19.0),
    c("Lib", "Libra", 15.20, -15.2),
    c("Lup", "Lupus", 15.22, -42.7),
    c("Lyn", "Lynx", 7.99, 47.5),
    c("Lyr", "Lyra", 18.85, 36.7),
    c("Men", "Mensa", 5.42, -77.5),
    c("Mic", "Microscopium", 20.96, -36.3),
    c("Mon", "Monoceros", 7.06, 0.3),
    c("Mus", "Musca", 12.59, -70.2),
    c("Nor", "Norma", 15.90, -51.4),
    c("Oct", "Octans", 23.00, -82.2),
    c("Oph", "Ophiuchus", 17.39, -7.9),
    c("Ori", "Orion", 5.58, 5.9),
    c("Pav", "Pavo", 19.61, -65.8),
    c("Peg", "Pegasus", 22.70, 19.5),
    c("Per", "Perseus", 3.18, 45.0),
    c("Phe", "Phoenix", 0.93, -48.6),
    c("Pic", "Pictor", 5.71, -53.5),
    c("Psc", "Pisces", 0.48, 13.7),
    c("PsA", "Piscis Austrinus", 22.28, -30.6),
    c("Pup", "Puppis", 7.25, -31.2),
    c("Pyx", "Pyxis", 8.95, -27.4),
    c("Ret", "Reticulum", 3.92, -60.0),
    c("Sge", "Sagitta", 19.65, 18.9),
    c("Sgr", "Sagittarius", 19.10, -28.5),
    c("Sco", "Scorpius", 16.89, -27.0),
    c("Scl", "Sculptor", 0.44, -32.1),
    c("Sct", "Scutum", 18.67, -9.9),
    c("Ser", "Serpens", 16.95, 6.1),
    c("Sex", "Sextans", 10.27, -2.6),
    c("Tau", "Taurus", 4.70, 14.9),
    c("Tel", "Telescopium", 19.33, -51.0),
    c("Tri", "Triangulum", 2.18, 31.5),
    c("TrA", "Triangulum Australe", 16.08, -65.4),
    c("Tuc", "Tucana", 23.78, -65.8),
    c("UMa", "Ursa Major", 11.31, 50.7),
    c("UMi", "Ursa Minor", 15.00, 77.7),
    c("Vel", "Vela", 9.58, -47.2),
    c("Vir", "Virgo", 13.41, -4.2),
    c("Vol", "Volans", 7.80, -69.8),
    c("Vul", "Vulpecula", 20.23, 24.4),
];

/// Look a constellation up by full name or abbreviation, ignoring case and extra spaces.
pub fn find_constellation(name: &str) -> Option<&'static Constellation> {
    let wanted = name.split_whitespace().join(" ");
    CONSTELLATIONS.iter().find(|c| {
        c.name.eq_ignore_ascii_case(&wanted) || c.abbreviation.eq_ignore_ascii_case(&wanted)
    })
}
