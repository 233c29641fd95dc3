/// Art styles offered in the storefront catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtStyle {
    ClassicOilPainting,
    WatercolorDreams,
    PastelBliss,
    GemstonePoly,
    Storybook3d,
    ArtisanCharcoal,
    PopArtBurst,
    NeonSplash,
}

impl ArtStyle {
    /// Catalog key sent as `style` on the wire
    pub fn id(&self) -> &'static str {
        match self {
            Self::ClassicOilPainting => "classic-oil-painting",
            Self::WatercolorDreams => "watercolor-dreams",
            Self::PastelBliss => "pastel-bliss",
            Self::GemstonePoly => "gemstone-poly",
            Self::Storybook3d => "3d-storybook",
            Self::ArtisanCharcoal => "artisan-charcoal",
            Self::PopArtBurst => "pop-art-burst",
            Self::NeonSplash => "neon-splash",
        }
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::ClassicOilPainting => "Classic Oil Painting",
            Self::WatercolorDreams => "Watercolor Dreams",
            Self::PastelBliss => "Pastel Bliss",
            Self::GemstonePoly => "Gemstone Poly",
            Self::Storybook3d => "3D Storybook",
            Self::ArtisanCharcoal => "Artisan Charcoal",
            Self::PopArtBurst => "Pop Art Burst",
            Self::NeonSplash => "Neon Splash",
        }
    }

    /// Prompt handed to the image model
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::ClassicOilPainting => {
                "Transform this photo into a classic oil painting with rich impasto brushwork, warm glazes and soft chiaroscuro lighting"
            }
            Self::WatercolorDreams => {
                "Repaint this photo as a loose watercolor with soft bleeding edges, visible paper grain and luminous washes"
            }
            Self::PastelBliss => {
                "Render this photo in chalky soft pastels with gentle gradients and a dreamy, airy palette"
            }
            Self::GemstonePoly => {
                "Rebuild this photo as faceted low-poly gemstone geometry with crisp refractive highlights"
            }
            Self::Storybook3d => {
                "Turn this photo into a whimsical 3D animated storybook scene with rounded forms and cinematic lighting"
            }
            Self::ArtisanCharcoal => {
                "Redraw this photo as an expressive charcoal sketch with smudged shading on textured paper"
            }
            Self::PopArtBurst => {
                "Reimagine this photo as bold pop art with halftone dots, flat saturated color blocks and thick outlines"
            }
            Self::NeonSplash => {
                "Reinterpret this photo with electric neon paint splashes glowing against a dark background"
            }
        }
    }

    /// Dominant color used for placeholder renders
    pub fn palette(&self) -> [u8; 3] {
        match self {
            Self::ClassicOilPainting => [168, 112, 62],
            Self::WatercolorDreams => [120, 170, 220],
            Self::PastelBliss => [240, 190, 210],
            Self::GemstonePoly => [60, 180, 160],
            Self::Storybook3d => [250, 200, 90],
            Self::ArtisanCharcoal => [70, 70, 70],
            Self::PopArtBurst => [230, 40, 90],
            Self::NeonSplash => [140, 60, 255],
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim();
        Self::all().into_iter().find(|style| style.id().eq_ignore_ascii_case(id))
    }

    /// All catalog styles
    pub fn all() -> [ArtStyle; 8] {
        [
            Self::ClassicOilPainting,
            Self::WatercolorDreams,
            Self::PastelBliss,
            Self::GemstonePoly,
            Self::Storybook3d,
            Self::ArtisanCharcoal,
            Self::PopArtBurst,
            Self::NeonSplash,
        ]
    }
}
