//! Built-in sample tree: the ape superfamily over the last 25 million years.

use crate::domain::{parse_species_json, LineageResult, SpeciesJson};

pub const HOMINOIDEA_JSON: &str = r#"{
  "name": "Hominoidea",
  "apparition": -25e6,
  "duration": 6e6,
  "descendants": [
    {
      "name": "Hilobates",
      "afterApparition": 6e6,
      "duration": 19e6,
      "image": "https://upload.wikimedia.org/wikipedia/commons/4/40/Hylobaes_lar_Canarias.jpg"
    },
    {
      "name": "Hominidae",
      "afterApparition": 6e6,
      "duration": 6e6,
      "descendants": [
        {
          "name": "Pongo",
          "afterApparition": 6e6,
          "duration": 13e6,
          "image": "https://upload.wikimedia.org/wikipedia/commons/6/65/Pongo_tapanuliensis.jpg"
        },
        {
          "name": "Homininae",
          "afterApparition": 6e6,
          "duration": 5e6,
          "descendants": [
            {
              "name": "Gorilla",
              "afterApparition": 5e6,
              "duration": 8e6,
              "image": "https://gorillas-world.com/wp-content/uploads/anatomia.jpg"
            },
            {
              "name": "Hominini",
              "afterApparition": 5e6,
              "duration": 2e6,
              "descendants": [
                {
                  "name": "Pan",
                  "afterApparition": 2e6,
                  "duration": 3e6,
                  "descendants": [
                    {
                      "name": "Pan Troglodytes",
                      "afterApparition": 3e6,
                      "duration": 3e6
                    },
                    {
                      "name": "Pan Paniscus",
                      "afterApparition": 3e6,
                      "duration": 3e6,
                      "image": "https://upload.wikimedia.org/wikipedia/commons/e/e2/Apeldoorn_Apenheul_zoo_Bonobo.jpg"
                    }
                  ]
                },
                {
                  "name": "Homo",
                  "afterApparition": 2e6,
                  "duration": 6e6
                }
              ]
            }
          ]
        }
      ]
    }
  ]
}"#;

pub fn hominoidea() -> LineageResult<SpeciesJson> {
    parse_species_json(HOMINOIDEA_JSON)
}
