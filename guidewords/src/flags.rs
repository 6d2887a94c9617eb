use std::path::PathBuf;

xflags::xflags! {
    /// Builds and inspects a travel-guide site.
    cmd guidewords {
        /// Compiles the site in <input> and writes it to <output>.
        cmd build {
            required input: PathBuf
            required output: PathBuf
        }

        /// Prints the guides matching a category and free-text query.
        cmd search {
            required input: PathBuf
            optional query: String
            optional -c, --category category: String
        }

        /// Prints the resource library for a category selection.
        cmd resources {
            required input: PathBuf
            optional --top top: String
            optional --sub sub: String
            optional --third third: String
        }
    }
}
